//! 评论与回复
//!
//! 回复只允许一层：[`Response`] 本身没有子节点。评论不参与进度聚合。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// 文本被修改过
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub user: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        id: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            text: text.into(),
            timestamp,
            edited: false,
            responses: Vec::new(),
        }
    }

    pub fn response(&self, response_id: &str) -> Option<&Response> {
        self.responses.iter().find(|r| r.id == response_id)
    }

    /// 回复 ID 形如 `{comment_id}-{n}`，n 从 `len + 1` 起跳过已占用值
    pub fn next_response_id(&self) -> String {
        (self.responses.len() + 1..)
            .map(|n| format!("{}-{}", self.id, n))
            .find(|candidate| self.response(candidate).is_none())
            .unwrap_or_default()
    }
}

impl Response {
    pub fn new(
        id: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            text: text.into(),
            timestamp,
        }
    }
}
