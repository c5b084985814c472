use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

use super::events::ServerEvent;
use crate::error::{Result, TransportError};
use crate::tasks::Task;

type Rooms = HashMap<String, HashMap<Uuid, UnboundedSender<String>>>;

/// 房间名：`project-{id}`
pub fn room_name(project_id: &str) -> String {
    format!("project-{}", project_id)
}

/// 项目房间表。克隆共享同一张表，服务端代码也可以直接向房间推送。
#[derive(Clone, Default)]
pub struct ProjectHub {
    rooms: Arc<Mutex<Rooms>>,
}

impl ProjectHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, project_id: &str, conn: Uuid, tx: UnboundedSender<String>) {
        let room = room_name(project_id);
        debug!(%conn, %room, "加入房间");
        self.rooms
            .lock()
            .await
            .entry(room)
            .or_default()
            .insert(conn, tx);
    }

    pub async fn leave(&self, project_id: &str, conn: Uuid) {
        let room = room_name(project_id);
        let mut rooms = self.rooms.lock().await;
        if let Some(members) = rooms.get_mut(&room) {
            members.remove(&conn);
            if members.is_empty() {
                rooms.remove(&room);
            }
        }
    }

    /// 连接断开时调用
    pub async fn leave_all(&self, conn: Uuid) {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }

    /// 向房间内所有连接发送原始文本，自动清理失效连接，返回成功发送数量
    pub async fn broadcast(&self, project_id: &str, msg: &str) -> usize {
        let room = room_name(project_id);
        let mut rooms = self.rooms.lock().await;
        let Some(members) = rooms.get_mut(&room) else {
            return 0;
        };
        members.retain(|_, tx| tx.send(msg.to_string()).is_ok());
        let sent = members.len();
        if sent == 0 {
            rooms.remove(&room);
        }
        sent
    }

    /// 以 `task-updated` 事件广播
    pub async fn publish(&self, project_id: &str, data: Value) -> Result<usize> {
        let msg = ServerEvent::TaskUpdated(data)
            .to_json()
            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
        let sent = self.broadcast(project_id, &msg).await;
        debug!(project = project_id, sent, "task-updated 已广播");
        Ok(sent)
    }

    /// 把任务快照推送到该任务的项目房间
    pub async fn publish_task(&self, task: &Task) -> Result<usize> {
        let mut data = serde_json::to_value(task)?;
        if let Value::Object(map) = &mut data {
            map.insert("projectId".to_string(), Value::String(task.id.clone()));
        }
        self.publish(&task.id, data).await
    }

    pub async fn room_size(&self, project_id: &str) -> usize {
        self.rooms
            .lock()
            .await
            .get(&room_name(project_id))
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::seed::seed_tasks;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_broadcast_reaches_room_only() {
        let hub = ProjectHub::new();
        let (a_tx, mut a_rx) = unbounded_channel();
        let (b_tx, mut b_rx) = unbounded_channel();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        hub.join("4", a, a_tx).await;
        hub.join("1", b, b_tx).await;

        assert_eq!(hub.broadcast("4", "hello").await, 1);
        assert_eq!(a_rx.recv().await.as_deref(), Some("hello"));
        assert!(b_rx.try_recv().is_err());
        assert_eq!(hub.broadcast("99", "nobody").await, 0);
    }

    #[tokio::test]
    async fn test_leave_and_disconnect() {
        let hub = ProjectHub::new();
        let (tx, _rx) = unbounded_channel();
        let conn = Uuid::new_v4();

        hub.join("1", conn, tx.clone()).await;
        hub.join("2", conn, tx).await;
        hub.leave("1", conn).await;
        assert_eq!(hub.room_size("1").await, 0);
        assert_eq!(hub.room_size("2").await, 1);

        hub.leave_all(conn).await;
        assert_eq!(hub.room_size("2").await, 0);
    }

    #[tokio::test]
    async fn test_closed_receivers_are_pruned() {
        let hub = ProjectHub::new();
        let (tx, rx) = unbounded_channel();
        hub.join("3", Uuid::new_v4(), tx).await;
        drop(rx);

        assert_eq!(hub.broadcast("3", "x").await, 0);
        assert_eq!(hub.room_size("3").await, 0);
    }

    #[tokio::test]
    async fn test_publish_task_snapshot() {
        let hub = ProjectHub::new();
        let (tx, mut rx) = unbounded_channel();
        hub.join("4", Uuid::new_v4(), tx).await;

        let task = seed_tasks().into_iter().find(|t| t.id == "4").unwrap();
        assert_eq!(hub.publish_task(&task).await.unwrap(), 1);

        let msg: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(msg["event"], "task-updated");
        assert_eq!(msg["data"]["projectId"], "4");
        assert_eq!(msg["data"]["progress"], 63);
    }
}
