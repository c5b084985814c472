//! 项目聊天室
//!
//! 每个任务可以有一个聊天室，消息按时间倒序保存（最新的在前）。
//! 与任务的更新传播一样，所有修改都以 `&self` 接收快照并返回新快照：
//!
//! | 操作 | 说明 |
//! |------|------|
//! | [`ChatRoom::compose`] | 按发送者生成新消息，空内容被拒绝 |
//! | [`ChatRoom::with_message`] | 追加消息 |
//! | [`ChatRoom::with_reply`] | 追加一条引用父消息的回复 |
//! | [`ChatRoom::with_like_toggled`] | 切换某用户对消息的点赞 |
//! | [`ChatRoom::without_message`] | 软删除：保留位置，替换内容 |
//! | [`ChatRoom::mention_candidates`] | `@` 提及的候选成员 |
//!
//! 目标消息不存在时原样返回快照。

mod message;
mod room;

pub use message::{DELETED_PLACEHOLDER, Message, MessageKind, ReplyQuote};
pub use room::{ChatMember, ChatRoom, insert_mention, mention_query};
