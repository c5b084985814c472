//! 可脚本化的任务数据源，用于在不依赖 mock 内存表或真实 HTTP 的情况下
//! 测试使用了 [`TaskBackend`] 的组件（主要是 `TaskService` 门面）。
//!
//! # 示例
//!
//! ```rust
//! use taskboard::testing::ScriptedBackend;
//! use taskboard::service::TaskService;
//! use taskboard::error::{ErrorKind, ServiceError};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = Arc::new(
//!     ScriptedBackend::new().with_error(ServiceError::NotImplemented("GET /tasks".into()).into())
//! );
//! let service = TaskService::new(backend.clone());
//!
//! let err = service.get_tasks().await.unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotImplemented);
//! assert_eq!(backend.call_count(), 1);
//! # }
//! ```

use crate::auth::Session;
use crate::error::{Result, TaskboardError};
use crate::search::ProjectFilter;
use crate::service::TaskBackend;
use crate::tasks::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 预设响应
enum Scripted {
    Tasks(Vec<Task>),
    Task(Task),
    Done,
    Err(TaskboardError),
}

/// 一次调用的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub op: &'static str,
    pub id: Option<String>,
}

/// 按顺序返回预设响应；队列耗尽或响应类型与调用不符时返回错误。
/// 所有调用都被记录，可通过 [`calls`](ScriptedBackend::calls) 检查。
pub struct ScriptedBackend {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    delay: Duration,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    fn push(self, response: Scripted) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// 追加一条列表响应（`list_tasks` / `search`）
    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        self.push(Scripted::Tasks(tasks))
    }

    /// 追加一条单任务响应（`get_task` / `create_task` / `update_task`）
    pub fn with_task(self, task: Task) -> Self {
        self.push(Scripted::Task(task))
    }

    /// 追加一条无返回值的成功响应（`delete_task`）
    pub fn with_done(self) -> Self {
        self.push(Scripted::Done)
    }

    pub fn with_error(self, err: TaskboardError) -> Self {
        self.push(Scripted::Err(err))
    }

    /// 每次调用前等待，用于测试取消
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 按顺序列出调用的操作名
    pub fn ops(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|c| c.op).collect()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    async fn next(&self, op: &'static str, id: Option<&str>) -> Result<Scripted> {
        self.calls.lock().unwrap().push(BackendCall {
            op,
            id: id.map(str::to_string),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Err(e)) => Err(e),
            Some(other) => Ok(other),
            None => Err(TaskboardError::Other(format!("{} 没有预设响应", op))),
        }
    }
}

fn mismatch(op: &str) -> TaskboardError {
    TaskboardError::Other(format!("{} 的预设响应类型不匹配", op))
}

#[async_trait]
impl TaskBackend for ScriptedBackend {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        match self.next("list_tasks", None).await? {
            Scripted::Tasks(tasks) => Ok(tasks),
            _ => Err(mismatch("list_tasks")),
        }
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        match self.next("get_task", Some(id)).await? {
            Scripted::Task(task) => Ok(task),
            _ => Err(mismatch("get_task")),
        }
    }

    async fn create_task(&self, _input: NewTask) -> Result<Task> {
        match self.next("create_task", None).await? {
            Scripted::Task(task) => Ok(task),
            _ => Err(mismatch("create_task")),
        }
    }

    async fn update_task(&self, id: &str, _patch: TaskPatch) -> Result<Task> {
        match self.next("update_task", Some(id)).await? {
            Scripted::Task(task) => Ok(task),
            _ => Err(mismatch("update_task")),
        }
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        match self.next("delete_task", Some(id)).await? {
            Scripted::Done => Ok(()),
            _ => Err(mismatch("delete_task")),
        }
    }

    async fn search(&self, _session: &Session, _filter: &ProjectFilter) -> Result<Vec<Task>> {
        match self.next("search", None).await? {
            Scripted::Tasks(tasks) => Ok(tasks),
            _ => Err(mismatch("search")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ServiceError, TransportError};
    use crate::service::TaskService;
    use crate::tasks::{NewSubtask, Progress, Subtask, SubtaskPatch};
    use chrono::{NaiveDate, Utc};
    use tokio_util::sync::CancellationToken;

    fn task_with_subtask() -> Task {
        let now = Utc::now();
        let task = Task::from_new(
            "7",
            NewTask::new(
                "Ship",
                "Ship the release",
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                "1",
            ),
            now,
        );
        task.with_subtask(Subtask::from_new("1", NewSubtask::new("Tag"), "1", now))
    }

    #[tokio::test]
    async fn test_backend_error_kind_passes_through() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_error(ServiceError::NotImplemented("GET /tasks".into()).into())
                .with_error(
                    TransportError::ApiError {
                        status: 500,
                        message: "boom".into(),
                    }
                    .into(),
                ),
        );
        let service = TaskService::new(backend.clone());

        let err = service.get_tasks().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        let err = service.get_task("1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        assert_eq!(backend.ops(), vec!["list_tasks", "get_task"]);
        assert_eq!(backend.calls()[1].id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_composite_reads_then_writes() {
        let task = task_with_subtask();
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_task(task.clone())
                .with_task(task.with_subtask_progress("1", Progress::COMPLETE)),
        );
        let service = TaskService::new(backend.clone());

        let updated = service
            .update_subtask("7", "1", SubtaskPatch::progress(Progress::COMPLETE))
            .await
            .unwrap();
        assert_eq!(updated.progress(), 100);
        assert_eq!(backend.ops(), vec!["get_task", "update_task"]);
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_missing_subtask_skips_write() {
        let backend = Arc::new(ScriptedBackend::new().with_task(task_with_subtask()));
        let service = TaskService::new(backend.clone());

        let err = service.remove_subtask("7", "9").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(backend.ops(), vec!["get_task"]);
    }

    #[tokio::test]
    async fn test_validation_short_circuits() {
        let backend = Arc::new(ScriptedBackend::new());
        let service = TaskService::new(backend.clone());

        let bad = NewTask::new(
            "",
            "no title",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            "1",
        );
        assert_eq!(
            service.create_task(bad).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(
            service
                .add_comment("7", "1", "John Doe", "   ")
                .await
                .is_err()
        );
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_and_mismatch() {
        let backend = ScriptedBackend::new().with_done();
        assert!(backend.list_tasks().await.is_err());
        assert!(backend.list_tasks().await.is_err());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_delay_allows_cancellation() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_tasks(Vec::new())
                .with_delay(Duration::from_secs(30)),
        );
        let token = CancellationToken::new();
        let service = TaskService::new(backend.clone()).with_cancellation(token.clone());
        token.cancel();

        let err = service.get_tasks().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
