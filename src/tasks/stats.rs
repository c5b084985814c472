//! 任务统计

use crate::tasks::progress::mean_rounded;
use crate::tasks::task::{Priority, Task, TaskStatus};
use chrono::NaiveDate;
use serde::Serialize;

/// 一组任务的统计快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub expired: usize,
    pub closed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// 任务平均进度
    pub average_progress: u8,
    /// 截止日期早于 today 且未完成/关闭的任务数
    pub overdue: usize,
    pub subtasks_total: usize,
    pub subtasks_complete: usize,
}

impl TaskStats {
    pub fn collect(tasks: &[Task], today: NaiveDate) -> Self {
        let mut stats = TaskStats {
            total: tasks.len(),
            average_progress: mean_rounded(tasks.iter().map(Task::progress)),
            ..Default::default()
        };

        for task in tasks {
            match task.status {
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Expired => stats.expired += 1,
                TaskStatus::Closed => stats.closed += 1,
            }
            match task.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
            if task.due_date < today && !task.status.is_finished() {
                stats.overdue += 1;
            }
            stats.subtasks_total += task.subtasks().len();
            stats.subtasks_complete += task
                .subtasks()
                .iter()
                .filter(|s| s.progress.is_complete())
                .count();
        }

        stats
    }

    /// 单行摘要
    pub fn summary(&self) -> String {
        format!(
            "任务: {} 个 | {} 进行中 | {} 已完成 | {} 已过期 | {} 已关闭 | 平均进度 {}% | {} 逾期 | 子任务 {}/{} 完成",
            self.total,
            self.in_progress,
            self.completed,
            self.expired,
            self.closed,
            self.average_progress,
            self.overdue,
            self.subtasks_complete,
            self.subtasks_total
        )
    }
}
