//! 项目房间实时推送
//!
//! 本地 WebSocket 服务，客户端按项目加入房间，任一客户端发出的任务更新
//! 会广播给同一房间内的所有连接（包括发送者本身）。
//!
//! # 协议
//!
//! **客户端 → 服务端**：
//! ```json
//! {"event": "join-project",  "data": "<projectId>"}
//! {"event": "leave-project", "data": "<projectId>"}
//! {"event": "task-update",   "data": {"projectId": "<projectId>", ...}}
//! ```
//!
//! **服务端 → 客户端**（房间 `project-{id}` 内广播）：
//! ```json
//! {"event": "task-updated", "data": {"projectId": "<projectId>", ...}}
//! ```
//!
//! 断开连接会把该连接从所有房间移除。不提供重连、顺序或送达保证。

mod events;
mod hub;
mod server;

pub use events::{ClientEvent, ServerEvent};
pub use hub::{ProjectHub, room_name};
pub use server::RealtimeServer;
