use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 客户端发来的事件
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinProject(Value),
    LeaveProject(Value),
    TaskUpdate(Value),
}

impl ClientEvent {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// 事件指向的项目 ID；字符串和数字形式都接受
    pub fn project_id(&self) -> Option<String> {
        match self {
            ClientEvent::JoinProject(id) | ClientEvent::LeaveProject(id) => id_of(id),
            ClientEvent::TaskUpdate(data) => data.get("projectId").and_then(id_of),
        }
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 推送给客户端的事件
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    TaskUpdated(Value),
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
