use crate::auth::{AuthBackend, Credentials, Registration, Session, User};
use crate::error::{Result, TransportError};
use crate::search::ProjectFilter;
use crate::service::TaskBackend;
use crate::service::http::{check_status, read_json};
use crate::tasks::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Deserialize)]
struct TasksEnvelope {
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    task: Task,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    data: AuthData,
}

#[derive(Deserialize)]
struct AuthData {
    user: Option<User>,
    token: Option<String>,
}

/// REST API 数据源
///
/// 端点（相对 `base_url`）：
///
/// | 操作 | 请求 | 响应 |
/// |------|------|------|
/// | list | `GET /tasks` | `{"tasks": [...]}` |
/// | get | `GET /tasks/{id}` | `{"task": {...}}` |
/// | create | `POST /tasks` | `{"task": {...}}` |
/// | update | `PUT /tasks/{id}` | `{"task": {...}}` |
/// | delete | `DELETE /tasks/{id}` | 任意 |
/// | search | `GET /search/projects?query&status&priority&startDate&endDate` | `[...]` |
/// | login | `POST /users/login` | `{"data": {"user", "token"}}` |
///
/// 登录成功后 token 保存在实例内，后续请求自动带上 `Authorization: Bearer`。
pub struct RemoteBackend {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl RemoteBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: RwLock::new(None),
        })
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
            ..self
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let builder = self.authorized(builder).await;
        Ok(builder.send().await?)
    }

    async fn session_from(&self, envelope: AuthEnvelope, fallback_token: Option<&str>) -> Result<Session> {
        let user = envelope.data.user.ok_or_else(|| {
            TransportError::InvalidResponse("响应缺少 user 字段".to_string())
        })?;
        let token = envelope
            .data
            .token
            .or_else(|| fallback_token.map(str::to_string))
            .ok_or_else(|| TransportError::InvalidResponse("响应缺少 token 字段".to_string()))?;
        *self.token.write().await = Some(token.clone());
        Ok(Session { user, token })
    }
}

#[async_trait]
impl TaskBackend for RemoteBackend {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let response = self.send(self.client.get(self.endpoint("tasks"))).await?;
        let envelope: TasksEnvelope = read_json(response).await?;
        debug!(count = envelope.tasks.len(), "远程任务列表");
        Ok(envelope.tasks)
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let url = self.endpoint(&format!("tasks/{}", id));
        let response = self.send(self.client.get(url)).await?;
        let envelope: TaskEnvelope = read_json(response).await?;
        Ok(envelope.task)
    }

    async fn create_task(&self, input: NewTask) -> Result<Task> {
        let builder = self.client.post(self.endpoint("tasks")).json(&input);
        let envelope: TaskEnvelope = read_json(self.send(builder).await?).await?;
        Ok(envelope.task)
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let url = self.endpoint(&format!("tasks/{}", id));
        let builder = self.client.put(url).json(&patch);
        let envelope: TaskEnvelope = read_json(self.send(builder).await?).await?;
        Ok(envelope.task)
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&format!("tasks/{}", id));
        check_status(self.send(self.client.delete(url)).await?).await?;
        Ok(())
    }

    async fn search(&self, session: &Session, filter: &ProjectFilter) -> Result<Vec<Task>> {
        let builder = self
            .client
            .get(self.endpoint("search/projects"))
            .query(&filter.to_query_pairs())
            .bearer_auth(session.bearer()?);
        let found: Vec<Task> = read_json(builder.send().await?).await?;
        let total = found.len();
        // 只保留调用方负责或参与、且满足全部条件的任务
        let hits: Vec<Task> = found
            .into_iter()
            .filter(|t| filter.matches_for(&session.user, t))
            .collect();
        debug!(total, kept = hits.len(), "远程搜索结果");
        Ok(hits)
    }
}

#[async_trait]
impl AuthBackend for RemoteBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let builder = self
            .client
            .post(self.endpoint("users/login"))
            .json(credentials);
        let envelope: AuthEnvelope = read_json(builder.send().await?).await?;
        let session = self.session_from(envelope, None).await?;
        info!(user = %session.user.id, "远程登录成功");
        Ok(session)
    }

    async fn register(&self, registration: &Registration) -> Result<Session> {
        let body = serde_json::json!({
            "email": registration.email,
            "password": registration.password,
            "firstName": registration.first_name,
            "lastName": registration.last_name,
            "phoneNumber": "",
        });
        let builder = self.client.post(self.endpoint("users/register")).json(&body);
        let envelope: AuthEnvelope = read_json(builder.send().await?).await?;
        self.session_from(envelope, None).await
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let builder = self
            .client
            .post(self.endpoint("users/logout"))
            .bearer_auth(token);
        check_status(builder.send().await?).await?;
        *self.token.write().await = None;
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<Session> {
        let builder = self.client.get(self.endpoint("users/me")).bearer_auth(token);
        let envelope: AuthEnvelope = read_json(builder.send().await?).await?;
        self.session_from(envelope, Some(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tasks::{NewSubtask, Priority, Progress, Subtask, TaskStatus};
    use chrono::{NaiveDate, Utc};
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// 启动一次性 HTTP 服务：读完一个请求，回写固定响应，返回原始请求文本
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}/api", addr), handle)
    }

    fn body_of(request: &str) -> Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn backend(base: String) -> RemoteBackend {
        RemoteBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_tasks_sends_bearer() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"tasks":[{"id":"1","title":"Docs","description":"d","dueDate":"2024-03-20","priority":"high"}]}"#,
        )
        .await;
        let tasks = backend(base).with_token("tok-1").list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, Priority::High);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/tasks "));
        assert!(request.contains("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn test_not_found_keeps_kind() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"Task not found"}"#).await;
        let err = backend(base).get_task("42").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("Task not found"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_not_implemented_keeps_kind() {
        let (base, server) = serve_once("501 Not Implemented", r#"{"error":"tasks route missing"}"#).await;
        let err = backend(base).delete_task("1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/tasks/1 "));
    }

    #[tokio::test]
    async fn test_search_serializes_filter() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let session = Session {
            user: crate::service::seed::mock_user(),
            token: "tok-2".to_string(),
        };
        let filter = ProjectFilter::new()
            .query("docs")
            .status(TaskStatus::InProgress)
            .priority(Priority::High);
        let hits = backend(base).search(&session, &filter).await.unwrap();
        assert!(hits.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "GET /api/search/projects?query=docs&status=in-progress&priority=High "
        ));
        assert!(request.to_lowercase().contains("authorization: bearer tok-2"));
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":{"user":{"_id":"u1","email":"a@b.c","name":"Ada"},"token":"jwt-1"}}"#,
        )
        .await;
        let remote = backend(base);
        let session = remote
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();
        assert_eq!(session.token, "jwt-1");
        assert_eq!(session.user.display_name, "Ada");
        assert_eq!(remote.token.read().await.as_deref(), Some("jwt-1"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/users/login "));
        assert!(request.contains(r#""password":"pw""#));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend(format!("http://{}/api", addr))
            .list_tasks()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_search_keeps_only_callers_matching_tasks() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[
                {"_id":"p1","title":"Project docs","description":"d","dueDate":"2024-03-20","priority":"High","status":"in-progress","owner":"1"},
                {"_id":"p2","title":"Other","description":"d","dueDate":"2024-03-20","priority":"Low","status":"completed","owner":"u9"}
            ]"#,
        )
        .await;
        let session = Session {
            user: crate::service::seed::mock_user(),
            token: "tok-3".to_string(),
        };
        let filter = ProjectFilter::new()
            .query("docs")
            .status(TaskStatus::InProgress)
            .priority(Priority::High);
        let hits = backend(base).search(&session, &filter).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["p1"]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_decodes_task_envelope() {
        let (base, server) = serve_once(
            "201 Created",
            r#"{"task":{"_id":"t9","title":"Release notes","description":"sprint","dueDate":"2024-04-02T00:00:00.000Z","priority":"Medium","status":"in-progress","owner":"1"}}"#,
        )
        .await;
        let input = NewTask::new(
            "Release notes",
            "sprint",
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            "1",
        )
        .with_priority(Priority::Medium);
        let task = backend(base).create_task(input).await.unwrap();
        assert_eq!(task.id, "t9");
        assert_eq!(task.created_by, "1");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/tasks "));
        let body = body_of(&request);
        assert_eq!(body["title"], "Release notes");
        assert_eq!(body["dueDate"], "2024-04-02");
    }

    #[tokio::test]
    async fn test_update_sends_only_present_fields() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"task":{"id":"4","title":"Renamed","description":"d","dueDate":"2024-09-01","priority":"high","progress":12,"subtasks":[{"id":"1","title":"Draft","progress":100}]}}"#,
        )
        .await;
        let subtask = Subtask::from_new(
            "1",
            NewSubtask::new("Draft").with_progress(Progress::COMPLETE),
            "1",
            Utc::now(),
        );
        let patch = TaskPatch::new().title("Renamed").subtasks(vec![subtask]);
        let task = backend(base).update_task("4", patch).await.unwrap();
        assert_eq!(task.title, "Renamed");
        assert_eq!(task.progress(), 100);

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /api/tasks/4 "));
        let body = body_of(&request);
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2, "unexpected keys: {:?}", keys);
        assert_eq!(body["title"], "Renamed");
        assert_eq!(body["subtasks"][0]["progress"], 100);
        assert_eq!(body["subtasks"][0]["title"], "Draft");
    }

    #[tokio::test]
    async fn test_register_stores_token() {
        let (base, server) = serve_once(
            "201 Created",
            r#"{"data":{"user":{"_id":"u5","email":"ada@example.com","name":"Ada Lovelace"},"token":"jwt-5"}}"#,
        )
        .await;
        let remote = backend(base);
        let session = remote
            .register(&Registration {
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.id, "u5");
        assert_eq!(remote.token.read().await.as_deref(), Some("jwt-5"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/users/register "));
        let body = body_of(&request);
        assert_eq!(body["firstName"], "Ada");
        assert_eq!(body["lastName"], "Lovelace");
        assert_eq!(body["password"], "secret");
    }

    #[tokio::test]
    async fn test_logout_clears_token() {
        let (base, server) = serve_once("200 OK", r#"{"message":"ok"}"#).await;
        let remote = backend(base).with_token("jwt-1");
        remote.logout("jwt-1").await.unwrap();
        assert!(remote.token.read().await.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/users/logout "));
        assert!(request.to_lowercase().contains("authorization: bearer jwt-1"));
    }

    #[tokio::test]
    async fn test_current_user_falls_back_to_given_token() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":{"user":{"_id":"u1","email":"a@b.c","name":"Ada"}}}"#,
        )
        .await;
        let remote = backend(base);
        let session = remote.current_user("jwt-9").await.unwrap();
        assert_eq!(session.token, "jwt-9");
        assert_eq!(session.user.email, "a@b.c");
        assert_eq!(remote.token.read().await.as_deref(), Some("jwt-9"));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/users/me "));
        assert!(request.to_lowercase().contains("authorization: bearer jwt-9"));
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthorized() {
        let (base, server) =
            serve_once("401 Unauthorized", r#"{"message":"Token is not valid"}"#).await;
        let err = backend(base)
            .with_token("stale")
            .list_tasks()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        server.await.unwrap();
    }
}
