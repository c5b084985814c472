use crate::auth::{AuthBackend, Credentials, Registration, Session, User};
use crate::error::{AuthError, Result, TaskboardError};
use crate::search::ProjectFilter;
use crate::service::TaskBackend;
use crate::service::seed::{MOCK_PASSWORD, MOCK_TOKEN, mock_user, seed_tasks};
use crate::tasks::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// 默认模拟网络延迟
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

/// 进程内存数据源。
///
/// 每次调用先等待固定延迟再操作内存列表；进程退出即丢失，不做持久化。
/// 并发写入由 `RwLock` 串行化，后写覆盖先写。
pub struct MockBackend {
    tasks: RwLock<Vec<Task>>,
    user: User,
    latency: Duration,
    next_id: AtomicU64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::empty()
    }
}

impl MockBackend {
    /// 没有任务，只有种子用户
    pub fn empty() -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            user: mock_user(),
            latency: DEFAULT_LATENCY,
            next_id: AtomicU64::new(1),
        }
    }

    /// 写入种子任务
    pub fn seeded() -> Self {
        Self::empty().with_tasks(seed_tasks())
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        let max_id = tasks
            .iter()
            .filter_map(|t| t.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id = AtomicU64::new(max_id + 1);
        self.tasks = RwLock::new(tasks);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn session(&self) -> Session {
        Session {
            user: self.user.clone(),
            token: MOCK_TOKEN.to_string(),
        }
    }

    fn check_token(&self, token: &str) -> Result<()> {
        if token != MOCK_TOKEN {
            return Err(AuthError::InvalidToken.into());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskBackend for MockBackend {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.delay().await;
        Ok(self.tasks.read().await.clone())
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        self.delay().await;
        self.tasks
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| TaskboardError::not_found("Task", id))
    }

    async fn create_task(&self, input: NewTask) -> Result<Task> {
        self.delay().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let task = Task::from_new(id, input, Utc::now());
        self.tasks.write().await.push(task.clone());
        debug!(task = %task.id, "mock 任务已创建");
        Ok(task)
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.delay().await;
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskboardError::not_found("Task", id))?;
        let next = slot.with_patch(&patch);
        *slot = next.clone();
        debug!(task = %id, progress = next.progress(), "mock 任务已更新");
        Ok(next)
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.delay().await;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(TaskboardError::not_found("Task", id));
        }
        debug!(task = %id, "mock 任务已删除");
        Ok(())
    }

    async fn search(&self, session: &Session, filter: &ProjectFilter) -> Result<Vec<Task>> {
        self.delay().await;
        self.check_token(&session.token)?;
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|t| filter.matches_for(&session.user, t))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.delay().await;
        if credentials.email == self.user.email && credentials.password == MOCK_PASSWORD {
            return Ok(self.session());
        }
        Err(AuthError::InvalidCredentials.into())
    }

    async fn register(&self, registration: &Registration) -> Result<Session> {
        self.delay().await;
        let mut session = self.session();
        session.user.email = registration.email.clone();
        session.user.display_name = registration.display_name();
        Ok(session)
    }

    async fn logout(&self, token: &str) -> Result<()> {
        self.delay().await;
        self.check_token(token)
    }

    async fn current_user(&self, token: &str) -> Result<Session> {
        self.delay().await;
        self.check_token(token)?;
        Ok(self.session())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserService;
    use crate::error::ErrorKind;
    use crate::service::seed::MOCK_EMAIL;
    use std::sync::Arc;

    fn backend() -> MockBackend {
        MockBackend::seeded().with_latency(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_login_with_seeded_user() {
        let backend = backend();
        let session = backend
            .login(&Credentials::new(MOCK_EMAIL, "password"))
            .await
            .unwrap();
        assert_eq!(session.token, MOCK_TOKEN);
        assert_eq!(session.user.email, MOCK_EMAIL);

        let err = backend
            .login(&Credentials::new(MOCK_EMAIL, "hunter2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_user_service_keeps_session() {
        let users = UserService::new(Arc::new(backend()));
        assert!(users.token().await.is_none());
        assert_eq!(
            users.current_user().await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );

        assert!(
            users
                .login(&Credentials::new(MOCK_EMAIL, "wrong"))
                .await
                .is_err()
        );
        assert!(users.session().await.is_none(), "失败的登录不应留下 token");

        users
            .login(&Credentials::new(MOCK_EMAIL, "password"))
            .await
            .unwrap();
        assert_eq!(users.token().await.as_deref(), Some(MOCK_TOKEN));
        assert_eq!(users.current_user().await.unwrap().user.id, "1");

        users.logout().await.unwrap();
        assert!(users.session().await.is_none());
    }

    #[tokio::test]
    async fn test_register_merges_user() {
        let users = UserService::new(Arc::new(backend()));
        let session = users
            .register(&Registration {
                email: "new@example.com".to_string(),
                password: "secret".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.display_name, "Ada Lovelace");
        assert_eq!(session.user.email, "new@example.com");
        assert_eq!(session.token, MOCK_TOKEN);
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let backend = backend();
        let input = NewTask::new(
            "t",
            "d",
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "1",
        );
        let a = backend.create_task(input.clone()).await.unwrap();
        let b = backend.create_task(input).await.unwrap();
        assert_eq!(a.id, "5");
        assert_eq!(b.id, "6");
        backend.delete_task("5").await.unwrap();
        assert_eq!(backend.list_tasks().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_search_scoped_to_caller() {
        let backend = backend();
        let session = backend
            .login(&Credentials::new(MOCK_EMAIL, "password"))
            .await
            .unwrap();
        let ids: Vec<String> = backend
            .search(&session, &ProjectFilter::new())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        // 任务 3 既不归属也未邀请种子用户
        assert_eq!(ids, vec!["1", "2", "4"]);

        let mut forged = session.clone();
        forged.token = "forged".to_string();
        assert!(backend.search(&forged, &ProjectFilter::new()).await.is_err());
    }
}
