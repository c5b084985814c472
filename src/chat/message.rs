use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 软删除后显示的内容
pub const DELETED_PLACEHOLDER: &str = "Message was deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Document,
}

/// 回复时对父消息的引用快照；父消息之后被删除也不影响引用内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyQuote {
    pub id: String,
    pub content: String,
    pub sender_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// 点过赞的用户 ID，不重复
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyQuote>,
    #[serde(default)]
    pub deleted: bool,
}

impl Message {
    pub fn text(
        id: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            content: content.into(),
            timestamp,
            kind: MessageKind::Text,
            file_url: None,
            file_name: None,
            likes: Vec::new(),
            reply_to: None,
            deleted: false,
        }
    }

    /// 改为图片/文件消息
    pub fn with_file(mut self, kind: MessageKind, url: impl Into<String>, name: Option<String>) -> Self {
        self.kind = kind;
        self.file_url = Some(url.into());
        self.file_name = name;
        self
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub(crate) fn quote(&self) -> ReplyQuote {
        ReplyQuote {
            id: self.id.clone(),
            content: self.content.clone(),
            sender_name: self.sender_name.clone(),
        }
    }

    pub(crate) fn toggle_like(&mut self, user_id: &str) {
        if self.is_liked_by(user_id) {
            self.likes.retain(|id| id != user_id);
        } else {
            self.likes.push(user_id.to_string());
        }
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
        self.content = DELETED_PLACEHOLDER.to_string();
        self.file_url = None;
        self.file_name = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let msg: Message = serde_json::from_value(json!({
            "id": "1",
            "senderId": "2",
            "senderName": "Jane Smith",
            "content": "I've updated the design mockups",
            "timestamp": "2024-03-01T10:00:00Z",
            "type": "image",
            "fileUrl": "file:///mock.png",
            "likes": ["1"]
        }))
        .unwrap();
        assert_eq!(msg.kind, MessageKind::Image);
        assert!(msg.is_liked_by("1"));
        assert!(!msg.deleted);

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "image");
        assert!(value.get("replyTo").is_none());
    }

    #[test]
    fn test_toggle_like_twice_restores() {
        let mut msg = Message::text("1", "2", "Jane Smith", "hi", Utc::now());
        msg.toggle_like("1");
        msg.toggle_like("3");
        assert_eq!(msg.like_count(), 2);
        msg.toggle_like("1");
        assert_eq!(msg.likes, vec!["3"]);
    }
}
