//! 用户与登录会话
//!
//! [`AuthBackend`] 是鉴权数据源的统一接口（mock / remote 两种实现见 `service`），
//! [`UserService`] 在其之上保存当前会话，替代全局单例与本地 token 存储：
//! 调用方显式构造并注入。

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default, alias = "avatar", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", alias = "updatedAt")]
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// 已登录会话：用户 + bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    /// 空 token 视为未登录
    pub fn bearer(&self) -> Result<&str> {
        if self.token.trim().is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        Ok(&self.token)
    }
}

/// 鉴权数据源
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    async fn register(&self, registration: &Registration) -> Result<Session>;

    async fn logout(&self, token: &str) -> Result<()>;

    /// 用 token 换取当前用户
    async fn current_user(&self, token: &str) -> Result<Session>;
}

/// 用户服务，持有当前会话
pub struct UserService {
    backend: Arc<dyn AuthBackend>,
    session: RwLock<Option<Session>>,
}

impl UserService {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            session: RwLock::new(None),
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let session = self.backend.login(credentials).await?;
        info!(user = %session.user.id, "登录成功");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session> {
        let session = self.backend.register(registration).await?;
        info!(user = %session.user.id, "注册成功");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// 登出；未登录时直接返回
    pub async fn logout(&self) -> Result<()> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(());
        };
        self.backend.logout(&session.token).await?;
        *self.session.write().await = None;
        Ok(())
    }

    /// 向数据源刷新当前用户
    pub async fn current_user(&self) -> Result<Session> {
        let token = self.token().await.ok_or(AuthError::MissingToken)?;
        let session = self.backend.current_user(&token).await?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.token.clone())
    }
}
