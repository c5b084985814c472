pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod realtime;
pub mod search;
pub mod service;
pub mod tasks;
pub mod testing;

pub mod prelude {
    pub use crate::auth::{Credentials, Session, User, UserService};
    pub use crate::chat::{ChatRoom, Message};
    pub use crate::config::AppConfig;
    pub use crate::error::{ErrorKind, Result, TaskboardError};
    pub use crate::search::ProjectFilter;
    pub use crate::service::{AppServices, TaskBackend, TaskService};
    pub use crate::tasks::{NewSubtask, NewTask, Progress, SubtaskPatch, Task, TaskPatch};
}
