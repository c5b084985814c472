//! 任务服务门面
//!
//! [`TaskBackend`] 是数据源的统一异步接口，两种实现在组装时选定：
//!
//! | 实现 | 说明 |
//! |------|------|
//! | [`MockBackend`] | 进程内存 + 固定模拟延迟，启动时写入种子数据 |
//! | [`RemoteBackend`] | 通过 HTTP 调用 REST API，保留错误类别到调用方 |
//!
//! [`TaskService`] 是交给调用方的门面：先校验输入，再转发给数据源，
//! 可选地绑定 [`CancellationToken`] 以中止进行中的调用。
//! 没有重试、缓存或请求合并。
//!
//! ```rust,no_run
//! use taskboard::service::{MockBackend, TaskService};
//! use std::sync::Arc;
//!
//! # async fn example() -> taskboard::error::Result<()> {
//! let service = TaskService::new(Arc::new(MockBackend::seeded()));
//! let tasks = service.get_tasks().await?;
//! println!("{} 个任务", tasks.len());
//! # Ok(())
//! # }
//! ```

mod http;
mod mock;
mod remote;
pub mod seed;

pub use mock::MockBackend;
pub use remote::RemoteBackend;

use crate::auth::{AuthBackend, Session, UserService};
use crate::config::{AppConfig, BackendKind};
use crate::error::{Result, ServiceError, TaskboardError};
use crate::search::ProjectFilter;
use crate::tasks::{
    Comment, NewSubtask, NewTask, Response, Subtask, SubtaskPatch, Task, TaskPatch,
};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 任务数据源
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>>;

    async fn get_task(&self, id: &str) -> Result<Task>;

    async fn create_task(&self, input: NewTask) -> Result<Task>;

    /// 合并部分更新；目标不存在时返回 `NotFound`
    async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task>;

    async fn delete_task(&self, id: &str) -> Result<()>;

    /// 按过滤条件搜索调用方负责或参与的任务
    async fn search(&self, session: &Session, filter: &ProjectFilter) -> Result<Vec<Task>>;
}

/// 任务服务门面
#[derive(Clone)]
pub struct TaskService {
    backend: Arc<dyn TaskBackend>,
    cancel: Option<CancellationToken>,
}

impl TaskService {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            backend,
            cancel: None,
        }
    }

    /// 返回绑定了取消令牌的副本，共享同一数据源
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            backend: self.backend.clone(),
            cancel: Some(token),
        }
    }

    async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        debug!(op, "调用任务数据源");
        let result: Result<T> = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ServiceError::Cancelled.into()),
                    result = fut => result,
                }
            }
            None => fut.await,
        };
        if let Err(e) = &result {
            warn!(op, kind = e.kind().as_str(), "任务数据源调用失败: {e}");
        }
        result
    }

    pub async fn get_tasks(&self) -> Result<Vec<Task>> {
        self.call("get_tasks", self.backend.list_tasks()).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        self.call("get_task", self.backend.get_task(id)).await
    }

    pub async fn create_task(&self, input: NewTask) -> Result<Task> {
        input.validate()?;
        self.call("create_task", self.backend.create_task(input)).await
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        patch.validate()?;
        self.call("update_task", self.backend.update_task(id, patch))
            .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        self.call("delete_task", self.backend.delete_task(id)).await
    }

    pub async fn search(&self, session: &Session, filter: &ProjectFilter) -> Result<Vec<Task>> {
        session.bearer()?;
        self.call("search", self.backend.search(session, filter))
            .await
    }

    // ── 组合操作：读取 → 传播 → 回写 ─────────────────────────────────────────

    pub async fn add_subtask(
        &self,
        task_id: &str,
        input: NewSubtask,
        created_by: &str,
    ) -> Result<Task> {
        input.validate()?;
        let task = self.get_task(task_id).await?;
        let subtask = Subtask::from_new(task.next_subtask_id(), input, created_by, Utc::now());
        self.commit_subtasks(task.with_subtask(subtask)).await
    }

    pub async fn update_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        patch: SubtaskPatch,
    ) -> Result<Task> {
        patch.validate()?;
        let task = self.get_task(task_id).await?;
        ensure_subtask(&task, subtask_id)?;
        self.commit_subtasks(task.with_subtask_patch(subtask_id, &patch))
            .await
    }

    pub async fn remove_subtask(&self, task_id: &str, subtask_id: &str) -> Result<Task> {
        let task = self.get_task(task_id).await?;
        ensure_subtask(&task, subtask_id)?;
        self.commit_subtasks(task.without_subtask(subtask_id)).await
    }

    pub async fn add_comment(
        &self,
        task_id: &str,
        subtask_id: &str,
        user: &str,
        text: &str,
    ) -> Result<Task> {
        require_text(text)?;
        let task = self.get_task(task_id).await?;
        let subtask = ensure_subtask(&task, subtask_id)?;
        let comment = Comment::new(subtask.next_comment_id(), user, text.trim(), Utc::now());
        self.commit_subtasks(task.with_comment(subtask_id, comment))
            .await
    }

    pub async fn add_response(
        &self,
        task_id: &str,
        subtask_id: &str,
        comment_id: &str,
        user: &str,
        text: &str,
    ) -> Result<Task> {
        require_text(text)?;
        let task = self.get_task(task_id).await?;
        let comment = ensure_subtask(&task, subtask_id)?
            .comment(comment_id)
            .ok_or_else(|| TaskboardError::not_found("Comment", comment_id))?;
        let response = Response::new(comment.next_response_id(), user, text.trim(), Utc::now());
        self.commit_subtasks(task.with_response(subtask_id, comment_id, response))
            .await
    }

    async fn commit_subtasks(&self, snapshot: Task) -> Result<Task> {
        let patch = TaskPatch::new().subtasks(snapshot.subtasks().to_vec());
        self.update_task(&snapshot.id, patch).await
    }
}

fn ensure_subtask<'a>(task: &'a Task, subtask_id: &str) -> Result<&'a Subtask> {
    task.subtask(subtask_id)
        .ok_or_else(|| TaskboardError::not_found("Subtask", subtask_id))
}

fn require_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(TaskboardError::missing_field("text"));
    }
    Ok(())
}

/// 组装好的服务集合，两个服务共享同一个数据源
pub struct AppServices {
    pub tasks: TaskService,
    pub users: UserService,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Mock => {
                let backend = MockBackend::seeded().with_latency(config.mock_latency());
                Ok(Self::with_backend(Arc::new(backend)))
            }
            BackendKind::Remote => {
                let backend = RemoteBackend::new(config.api_url(), config.request_timeout())?;
                Ok(Self::with_backend(Arc::new(backend)))
            }
        }
    }

    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: TaskBackend + AuthBackend + 'static,
    {
        Self {
            tasks: TaskService::new(backend.clone()),
            users: UserService::new(backend),
        }
    }
}
