//! 任务定义

use crate::error::{Result, TaskboardError, ValidationError};
use crate::tasks::dates::due_date;
use crate::tasks::input::NewTask;
use crate::tasks::progress::aggregate_progress;
use crate::tasks::subtask::Subtask;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    /// 进行中
    #[default]
    #[serde(rename = "In Progress", alias = "in-progress", alias = "In progress")]
    InProgress,
    /// 已完成
    #[serde(rename = "completed")]
    Completed,
    /// 已过期
    #[serde(rename = "expired")]
    Expired,
    /// 已关闭
    #[serde(rename = "closed")]
    Closed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Expired => "expired",
            TaskStatus::Closed => "closed",
        }
    }

    /// 后端 Project 文档中的拼写，用于查询参数
    pub fn backend_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in-progress",
            other => other.as_str(),
        }
    }

    /// 已完成或已关闭的任务不再计入逾期
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Closed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "in progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "expired" => Ok(TaskStatus::Expired),
            "closed" => Ok(TaskStatus::Closed),
            _ => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("未知状态 '{}'", s),
            }
            .into()),
        }
    }
}

/// 任务优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "low", alias = "Low")]
    Low,
    #[default]
    #[serde(rename = "medium", alias = "Medium")]
    Medium,
    #[serde(rename = "high", alias = "High")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// 后端 Project 文档中的拼写（首字母大写）
    pub fn backend_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ValidationError::InvalidValue {
                field: "priority".to_string(),
                message: format!("未知优先级 '{}'", s),
            }
            .into()),
        }
    }
}

/// 任务参与者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "name")]
    pub display_name: String,
}

impl Participant {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            display_name: display_name.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// 任务快照。
///
/// `progress` 是派生字段：只能由子任务聚合得出，任何构造、反序列化和变更
/// 都会重新计算。`subtasks` 只读暴露，修改必须经过 [`propagate`](super::propagate)
/// 中的 `with_*` / `without_*` 方法，它们返回新快照而不改动原值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TaskRecord")]
pub struct Task {
    /// 任务 ID
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(with = "due_date")]
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// 创建者（后端文档中的 owner）
    pub created_by: String,
    pub participants: Vec<Participant>,
    pub(crate) subtasks: Vec<Subtask>,
    pub(crate) progress: u8,
}

impl Task {
    /// 由创建表单生成新任务：无子任务，进度为 0
    pub fn from_new(id: impl Into<String>, input: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            created_at: now,
            last_updated: now,
            created_by: input.created_by,
            participants: input.participants,
            subtasks: Vec::new(),
            progress: 0,
        }
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// 聚合进度 (0-100)
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    pub fn has_subtask(&self, subtask_id: &str) -> bool {
        self.subtask(subtask_id).is_some()
    }

    /// 调用方是否为负责人或参与者（按 id 或邮箱匹配）
    pub fn involves(&self, user_id: &str, email: &str) -> bool {
        self.created_by == user_id
            || self.participants.iter().any(|p| {
                p.id.as_deref() == Some(user_id) || (!email.is_empty() && p.email == email)
            })
    }

    /// 下一个子任务 ID：`len + 1`，跳过已占用的值
    pub fn next_subtask_id(&self) -> String {
        next_free_id(self.subtasks.len(), |candidate| self.has_subtask(candidate))
    }

    pub(crate) fn recompute(&mut self) {
        self.progress = aggregate_progress(&self.subtasks);
    }
}

/// 从 `start + 1` 开始找第一个未被占用的数字 ID
pub(crate) fn next_free_id(start: usize, taken: impl Fn(&str) -> bool) -> String {
    (start + 1..)
        .map(|n| n.to_string())
        .find(|candidate| !taken(candidate))
        .unwrap_or_default()
}

/// 反序列化中间形态，兼容后端 Project 文档的字段名；进度字段即使存在也被忽略
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(alias = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    priority: Priority,
    #[serde(with = "due_date")]
    due_date: NaiveDate,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", alias = "updatedAt")]
    last_updated: DateTime<Utc>,
    #[serde(default, alias = "owner")]
    created_by: String,
    #[serde(default)]
    participants: Vec<Participant>,
    #[serde(default)]
    subtasks: Vec<Subtask>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let mut task = Task {
            id: record.id,
            title: record.title,
            description: record.description,
            status: record.status,
            priority: record.priority,
            due_date: record.due_date,
            created_at: record.created_at,
            last_updated: record.last_updated,
            created_by: record.created_by,
            participants: record.participants,
            subtasks: record.subtasks,
            progress: 0,
        };
        task.recompute();
        task
    }
}
