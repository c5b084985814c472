use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::Message;
use crate::error::{Result, TaskboardError};

/// 发送者不在成员列表中时使用的名字
const UNKNOWN_SENDER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMember {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl ChatMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
            is_admin: false,
        }
    }
}

/// 聊天室快照，`messages` 最新的在前
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub participants: Vec<ChatMember>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl ChatRoom {
    pub fn new(
        id: impl Into<String>,
        task_id: impl Into<String>,
        title: impl Into<String>,
        participants: Vec<ChatMember>,
    ) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            title: title.into(),
            participants,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// 聊天列表里展示的最后一条消息
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn member(&self, user_id: &str) -> Option<&ChatMember> {
        self.participants.iter().find(|p| p.id == user_id)
    }

    /// 下一个消息 ID：`len + 1`，跳过已占用的值
    pub fn next_message_id(&self) -> String {
        (self.messages.len() + 1..)
            .map(|n| n.to_string())
            .find(|candidate| self.message(candidate).is_none())
            .unwrap_or_default()
    }

    /// 按发送者生成一条文本消息；内容两端空白会被去掉，空内容返回校验错误
    pub fn compose(&self, sender_id: &str, content: &str, now: DateTime<Utc>) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TaskboardError::missing_field("content"));
        }
        let sender_name = self
            .member(sender_id)
            .map_or(UNKNOWN_SENDER, |m| m.name.as_str());
        Ok(Message::text(
            self.next_message_id(),
            sender_id,
            sender_name,
            content,
            now,
        ))
    }

    pub fn with_message(&self, message: Message) -> ChatRoom {
        let mut next = self.clone();
        next.messages.insert(0, message);
        next
    }

    /// 追加回复并记下父消息的引用；父消息不存在时原样返回
    pub fn with_reply(&self, parent_id: &str, mut message: Message) -> ChatRoom {
        let Some(parent) = self.message(parent_id) else {
            debug!(room = %self.id, parent = %parent_id, "父消息不存在，忽略回复");
            return self.clone();
        };
        message.reply_to = Some(parent.quote());
        self.with_message(message)
    }

    /// 该用户已点赞则取消，否则点赞
    pub fn with_like_toggled(&self, message_id: &str, user_id: &str) -> ChatRoom {
        self.edit_message(message_id, |m| m.toggle_like(user_id))
    }

    /// 软删除：消息保留在原位，内容替换为占位文本
    pub fn without_message(&self, message_id: &str) -> ChatRoom {
        self.edit_message(message_id, Message::mark_deleted)
    }

    /// `@` 之后输入的片段匹配到的成员（名字包含该片段，不区分大小写），不含当前用户
    pub fn mention_candidates(&self, query: &str, current_user: &str) -> Vec<&ChatMember> {
        let needle = query.trim().to_lowercase();
        self.participants
            .iter()
            .filter(|p| p.id != current_user && p.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// 消息中以 `@名字` 提及的成员
    pub fn mentioned_members(&self, content: &str) -> Vec<&ChatMember> {
        self.participants
            .iter()
            .filter(|p| content.contains(&format!("@{}", p.name)))
            .collect()
    }

    fn edit_message(&self, message_id: &str, edit: impl FnOnce(&mut Message)) -> ChatRoom {
        let Some(index) = self.messages.iter().position(|m| m.id == message_id) else {
            debug!(room = %self.id, msg_id = %message_id, "消息不存在，快照保持不变");
            return self.clone();
        };
        let mut next = self.clone();
        edit(&mut next.messages[index]);
        next
    }
}

/// 输入框文本中最后一个 `@` 之后的片段；没有 `@` 时为 `None`
pub fn mention_query(text: &str) -> Option<&str> {
    text.rfind('@').map(|at| &text[at + 1..])
}

/// 用成员全名替换最后一个 `@` 片段，并补一个空格
pub fn insert_mention(text: &str, member: &ChatMember) -> String {
    match text.rfind('@') {
        Some(at) => format!("{}@{} ", &text[..at], member.name),
        None => format!("{}@{} ", text, member.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::DELETED_PLACEHOLDER;
    use crate::error::ErrorKind;

    fn room() -> ChatRoom {
        let now = Utc::now();
        let base = ChatRoom::new(
            "1",
            "4",
            "NFT Mobile App Design",
            vec![
                ChatMember::new("1", "John Doe"),
                ChatMember::new("2", "Jane Smith"),
                ChatMember::new("3", "Mike Johnson"),
            ],
        );
        let first = base.compose("2", "Updated the gallery mockups", now).unwrap();
        base.with_message(first)
    }

    #[test]
    fn test_compose_and_order() {
        let room = room();
        let msg = room.compose("1", "  Looks great  ", Utc::now()).unwrap();
        assert_eq!(msg.id, "2");
        assert_eq!(msg.sender_name, "John Doe");
        assert_eq!(msg.content, "Looks great");

        let next = room.with_message(msg);
        assert_eq!(next.last_message().unwrap().id, "2");
        assert_eq!(next.messages().len(), 2);
        assert_eq!(room.messages().len(), 1, "原快照不变");

        let stranger = next.compose("99", "hello", Utc::now()).unwrap();
        assert_eq!(stranger.sender_name, "Unknown");

        let err = next.compose("1", "   ", Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_reply_quotes_parent() {
        let room = room();
        let reply = room.compose("1", "Agreed", Utc::now()).unwrap();
        let next = room.with_reply("1", reply.clone());
        let quote = next.last_message().unwrap().reply_to.clone().unwrap();
        assert_eq!(quote.id, "1");
        assert_eq!(quote.sender_name, "Jane Smith");
        assert_eq!(quote.content, "Updated the gallery mockups");

        // 父消息删除后引用内容保留
        let next = next.without_message("1");
        assert_eq!(next.message("1").unwrap().content, DELETED_PLACEHOLDER);
        assert_eq!(
            next.message("2").unwrap().reply_to.as_ref().unwrap().content,
            "Updated the gallery mockups"
        );

        assert_eq!(room.with_reply("42", reply), room);
    }

    #[test]
    fn test_like_toggle_per_user() {
        let room = room();
        let liked = room.with_like_toggled("1", "1").with_like_toggled("1", "3");
        assert_eq!(liked.message("1").unwrap().like_count(), 2);
        assert!(!room.message("1").unwrap().is_liked_by("1"));

        let unliked = liked.with_like_toggled("1", "1");
        assert_eq!(unliked.message("1").unwrap().likes, vec!["3"]);
        assert_eq!(room.with_like_toggled("42", "1"), room);
    }

    #[test]
    fn test_soft_delete_keeps_position() {
        let room = room();
        let two = room.with_message(room.compose("3", "second", Utc::now()).unwrap());
        let deleted = two.without_message("1");
        assert_eq!(deleted.messages().len(), 2);
        let msg = deleted.message("1").unwrap();
        assert!(msg.deleted);
        assert_eq!(msg.content, DELETED_PLACEHOLDER);
        assert_eq!(deleted.next_message_id(), "3");
        assert_eq!(two.without_message("42"), two);
    }

    #[test]
    fn test_mentions() {
        let room = room();
        let names: Vec<&str> = room
            .mention_candidates("j", "1")
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["Jane Smith", "Mike Johnson"]);
        assert_eq!(room.mention_candidates("", "1").len(), 2);

        assert_eq!(mention_query("ping @Ja"), Some("Ja"));
        assert_eq!(mention_query("no mention"), None);

        let jane = room.member("2").unwrap();
        let text = insert_mention("ping @Ja", jane);
        assert_eq!(text, "ping @Jane Smith ");

        let mentioned: Vec<&str> = room
            .mentioned_members(&text)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(mentioned, vec!["2"]);
    }
}
