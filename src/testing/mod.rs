//! 测试基础设施
//!
//! 提供在不依赖 mock 内存表或真实 REST API 的情况下测试任务服务的工具。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`ScriptedBackend`] | 按顺序返回预设响应的 [`TaskBackend`](crate::service::TaskBackend)，用于测试门面的校验、组合操作与错误透传 |
//!
//! # 设计原则
//!
//! - **零网络请求**：完全在内存中运行
//! - **可脚本化**：通过 `with_task()` / `with_tasks()` / `with_error()` 精确控制返回值
//! - **可观测**：通过 `call_count()` / `ops()` / `calls()` 检查调用顺序
//! - **线程安全**：内部使用 `Arc<Mutex<_>>`，可安全地在多任务测试中共享
//!
//! 需要真实 HTTP 交互的测试见 `service::remote` 中基于本地 `TcpListener` 的用例。

mod scripted_backend;

pub use scripted_backend::{BackendCall, ScriptedBackend};
