//! 创建/修改输入
//!
//! 这些类型在到达任何数据源之前先经过 `validate()`，
//! 对应前端表单与后端校验器的规则：标题、描述不能为空。

use crate::error::{Result, TaskboardError};
use crate::tasks::dates::{due_date, optional_due_date};
use crate::tasks::progress::Progress;
use crate::tasks::subtask::Subtask;
use crate::tasks::task::{Participant, Priority, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TaskboardError::missing_field(field));
    }
    Ok(())
}

/// 新建任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(with = "due_date")]
    pub due_date: NaiveDate,
    pub created_by: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: NaiveDate,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: TaskStatus::default(),
            priority: Priority::default(),
            due_date,
            created_by: created_by.into(),
            participants: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_participants(mut self, participants: Vec<Participant>) -> Self {
        self.participants = participants;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require("description", &self.description)
    }
}

/// 任务的部分更新，`None` 表示保留原值。
///
/// 提供 `subtasks` 会整体替换子任务列表并触发进度重算；
/// 进度本身不可直接修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        with = "optional_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn participants(mut self, participants: Vec<Participant>) -> Self {
        self.participants = Some(participants);
        self
    }

    pub fn subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = Some(subtasks);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(description) = &self.description {
            require("description", description)?;
        }
        if let Some(subtasks) = &self.subtasks {
            for subtask in subtasks {
                require("subtask title", &subtask.title)?;
            }
        }
        Ok(())
    }
}

/// 新建子任务
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubtask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assignee: Vec<String>,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(
        default,
        with = "optional_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl NewSubtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_assignee(mut self, assignee: Vec<String>) -> Self {
        self.assignee = assignee;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }
}

/// 子任务的部分更新
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(
        default,
        with = "optional_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl SubtaskPatch {
    pub fn progress(progress: Progress) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        Ok(())
    }
}
