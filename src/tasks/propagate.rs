//! 更新传播
//!
//! 所有操作都以 `&self` 接收当前快照并返回新快照，原值保持不变：
//!
//! 1. 克隆快照，按 ID 定位目标（子任务 → 评论 → 回复）
//! 2. 合并修改，刷新目标及任务的 `last_updated`
//! 3. 子任务集合或进度变化时重算任务进度；评论类修改不影响进度
//!
//! 目标 ID 不存在时原样返回快照（静默 no-op，仅记 debug 日志）。
//! 需要区分"未命中"的调用方可先用 [`Task::has_subtask`] 检查，
//! 或走 `TaskService` 的组合操作，那里会返回 `NotFound`。
//!
//! 每个操作都有 `_at(now)` 版本用于注入时间。

use crate::tasks::comment::{Comment, Response};
use crate::tasks::input::{SubtaskPatch, TaskPatch};
use crate::tasks::progress::Progress;
use crate::tasks::subtask::Subtask;
use crate::tasks::task::Task;
use chrono::{DateTime, Utc};
use tracing::debug;

impl Task {
    /// 合并任务级修改
    pub fn with_patch(&self, patch: &TaskPatch) -> Task {
        self.with_patch_at(patch, Utc::now())
    }

    pub fn with_patch_at(&self, patch: &TaskPatch, now: DateTime<Utc>) -> Task {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = title.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if let Some(participants) = &patch.participants {
            next.participants = participants.clone();
        }
        if let Some(subtasks) = &patch.subtasks {
            next.subtasks = subtasks.clone();
        }
        next.last_updated = now;
        next.recompute();
        next
    }

    /// 追加子任务
    pub fn with_subtask(&self, subtask: Subtask) -> Task {
        self.with_subtask_at(subtask, Utc::now())
    }

    pub fn with_subtask_at(&self, subtask: Subtask, now: DateTime<Utc>) -> Task {
        let mut next = self.clone();
        next.subtasks.push(subtask);
        next.last_updated = now;
        next.recompute();
        next
    }

    /// 合并子任务修改
    pub fn with_subtask_patch(&self, subtask_id: &str, patch: &SubtaskPatch) -> Task {
        self.with_subtask_patch_at(subtask_id, patch, Utc::now())
    }

    pub fn with_subtask_patch_at(
        &self,
        subtask_id: &str,
        patch: &SubtaskPatch,
        now: DateTime<Utc>,
    ) -> Task {
        self.edit_subtask(subtask_id, now, |subtask| subtask.apply(patch, now))
    }

    pub fn with_subtask_progress(&self, subtask_id: &str, progress: Progress) -> Task {
        self.with_subtask_progress_at(subtask_id, progress, Utc::now())
    }

    pub fn with_subtask_progress_at(
        &self,
        subtask_id: &str,
        progress: Progress,
        now: DateTime<Utc>,
    ) -> Task {
        self.with_subtask_patch_at(subtask_id, &SubtaskPatch::progress(progress), now)
    }

    /// 删除子任务；删掉最后一个后进度归 0
    pub fn without_subtask(&self, subtask_id: &str) -> Task {
        self.without_subtask_at(subtask_id, Utc::now())
    }

    pub fn without_subtask_at(&self, subtask_id: &str, now: DateTime<Utc>) -> Task {
        if !self.has_subtask(subtask_id) {
            debug!(task = %self.id, subtask = %subtask_id, "子任务不存在，忽略删除");
            return self.clone();
        }
        let mut next = self.clone();
        next.subtasks.retain(|s| s.id != subtask_id);
        next.last_updated = now;
        next.recompute();
        next
    }

    // ── 评论 ──────────────────────────────────────────────────────────────────

    pub fn with_comment(&self, subtask_id: &str, comment: Comment) -> Task {
        self.with_comment_at(subtask_id, comment, Utc::now())
    }

    pub fn with_comment_at(&self, subtask_id: &str, comment: Comment, now: DateTime<Utc>) -> Task {
        self.edit_subtask(subtask_id, now, |subtask| {
            subtask.comments.push(comment);
            subtask.last_updated = now;
        })
    }

    /// 修改评论文本并标记为已编辑
    pub fn with_comment_text(&self, subtask_id: &str, comment_id: &str, text: &str) -> Task {
        self.with_comment_text_at(subtask_id, comment_id, text, Utc::now())
    }

    pub fn with_comment_text_at(
        &self,
        subtask_id: &str,
        comment_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Task {
        self.edit_comment(subtask_id, comment_id, now, |comment| {
            comment.text = text.to_string();
            comment.edited = true;
        })
    }

    pub fn without_comment(&self, subtask_id: &str, comment_id: &str) -> Task {
        self.without_comment_at(subtask_id, comment_id, Utc::now())
    }

    pub fn without_comment_at(
        &self,
        subtask_id: &str,
        comment_id: &str,
        now: DateTime<Utc>,
    ) -> Task {
        let present = self
            .subtask(subtask_id)
            .is_some_and(|s| s.comment(comment_id).is_some());
        if !present {
            debug!(task = %self.id, subtask = %subtask_id, comment = %comment_id, "评论不存在，忽略删除");
            return self.clone();
        }
        self.edit_subtask(subtask_id, now, |subtask| {
            subtask.comments.retain(|c| c.id != comment_id);
            subtask.last_updated = now;
        })
    }

    // ── 回复 ──────────────────────────────────────────────────────────────────

    pub fn with_response(&self, subtask_id: &str, comment_id: &str, response: Response) -> Task {
        self.with_response_at(subtask_id, comment_id, response, Utc::now())
    }

    pub fn with_response_at(
        &self,
        subtask_id: &str,
        comment_id: &str,
        response: Response,
        now: DateTime<Utc>,
    ) -> Task {
        self.edit_comment(subtask_id, comment_id, now, |comment| {
            comment.responses.push(response);
        })
    }

    pub fn without_response(&self, subtask_id: &str, comment_id: &str, response_id: &str) -> Task {
        self.without_response_at(subtask_id, comment_id, response_id, Utc::now())
    }

    pub fn without_response_at(
        &self,
        subtask_id: &str,
        comment_id: &str,
        response_id: &str,
        now: DateTime<Utc>,
    ) -> Task {
        let present = self
            .subtask(subtask_id)
            .and_then(|s| s.comment(comment_id))
            .is_some_and(|c| c.response(response_id).is_some());
        if !present {
            debug!(task = %self.id, comment = %comment_id, response = %response_id, "回复不存在，忽略删除");
            return self.clone();
        }
        self.edit_comment(subtask_id, comment_id, now, |comment| {
            comment.responses.retain(|r| r.id != response_id);
        })
    }

    // ── 内部定位 ──────────────────────────────────────────────────────────────

    fn edit_subtask(
        &self,
        subtask_id: &str,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut Subtask),
    ) -> Task {
        let Some(index) = self.subtasks.iter().position(|s| s.id == subtask_id) else {
            debug!(task = %self.id, subtask = %subtask_id, "子任务不存在，快照保持不变");
            return self.clone();
        };
        let mut next = self.clone();
        edit(&mut next.subtasks[index]);
        next.last_updated = now;
        next.recompute();
        next
    }

    fn edit_comment(
        &self,
        subtask_id: &str,
        comment_id: &str,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut Comment),
    ) -> Task {
        let found = self
            .subtask(subtask_id)
            .is_some_and(|s| s.comment(comment_id).is_some());
        if !found {
            debug!(task = %self.id, subtask = %subtask_id, comment = %comment_id, "评论不存在，快照保持不变");
            return self.clone();
        }
        self.edit_subtask(subtask_id, now, |subtask| {
            if let Some(comment) = subtask.comment_mut(comment_id) {
                edit(comment);
            }
            subtask.last_updated = now;
        })
    }
}
