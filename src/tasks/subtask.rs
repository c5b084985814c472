//! 子任务定义

use crate::tasks::comment::Comment;
use crate::tasks::dates::optional_due_date;
use crate::tasks::input::{NewSubtask, SubtaskPatch};
use crate::tasks::progress::Progress;
use crate::tasks::task::next_free_id;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 子任务，从属于父任务，没有独立生命周期。
/// 只有 `progress` 参与父任务的进度聚合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 负责人列表
    #[serde(default)]
    pub assignee: Vec<String>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(
        default,
        with = "optional_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Subtask {
    pub fn from_new(
        id: impl Into<String>,
        input: NewSubtask,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: input.title,
            description: input.description,
            assignee: input.assignee,
            progress: input.progress.unwrap_or_default(),
            due_date: input.due_date,
            created_by: created_by.into(),
            created_at: now,
            last_updated: now,
            comments: Vec::new(),
        }
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub(crate) fn comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }

    pub fn next_comment_id(&self) -> String {
        next_free_id(self.comments.len(), |candidate| {
            self.comment(candidate).is_some()
        })
    }

    pub(crate) fn apply(&mut self, patch: &SubtaskPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee = assignee.clone();
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        self.last_updated = now;
    }
}
