//! 项目搜索过滤
//!
//! 过滤条件之间是"与"关系：
//!
//! - `query`：标题或描述包含该子串（不区分大小写）
//! - `status` / `priority`：精确匹配
//! - `start_date` / `end_date`：截止日期落在闭区间内
//!
//! 结果范围始终限定为调用方负责或参与的任务。

use crate::auth::User;
use crate::tasks::{Priority, Task, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
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

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// 只看条件本身，不考虑调用方范围
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(query) = self.query.as_deref().map(str::trim)
            && !query.is_empty()
        {
            let needle = query.to_lowercase();
            let hit = task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.start_date.is_some_and(|start| task.due_date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| task.due_date > end) {
            return false;
        }
        true
    }

    /// 条件匹配且调用方是负责人或参与者
    pub fn matches_for(&self, caller: &User, task: &Task) -> bool {
        task.involves(&caller.id, &caller.email) && self.matches(task)
    }

    /// 转成 `GET /search/projects` 的查询参数。
    ///
    /// 状态与优先级使用后端文档的拼写（`in-progress`、`High`），日期为 `YYYY-MM-DD`。
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.backend_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.backend_str().to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", end.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}
