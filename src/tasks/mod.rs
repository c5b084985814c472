//! 任务数据模型
//!
//! 任务 → 子任务 → 评论 → 回复 的嵌套结构，以及围绕它的三个纯逻辑部件：
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`progress`] | 进度值类型与聚合函数 |
//! | [`propagate`] | 写时复制的更新传播，每次修改返回新快照 |
//! | [`stats`] | 任务集合的统计摘要 |

mod comment;
mod dates;
mod input;
pub mod progress;
pub mod propagate;
pub mod stats;
mod subtask;
mod task;

pub use comment::{Comment, Response};
pub use dates::parse_due_date;
pub use input::{NewSubtask, NewTask, SubtaskPatch, TaskPatch};
pub use progress::{Progress, aggregate_progress};
pub use stats::TaskStats;
pub use subtask::Subtask;
pub use task::{Participant, Priority, Task, TaskStatus};
