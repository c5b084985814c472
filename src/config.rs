//! 应用配置
//!
//! 来源优先级：环境变量 > YAML 文件 > 默认值。环境变量在读取前先加载 `.env`：
//! ```text
//! TASKBOARD_BACKEND=mock|remote
//! TASKBOARD_ENV=development|production
//! TASKBOARD_DEV_API_URL=http://localhost:3000/api
//! TASKBOARD_PROD_API_URL=https://api.example.com/api
//! TASKBOARD_MOCK_LATENCY_MS=500
//! TASKBOARD_REQUEST_TIMEOUT_SECS=10
//! TASKBOARD_WS_PORT=3001
//! ```

use crate::error::{ConfigError, Result};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// 数据源选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Mock,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub environment: Environment,
    pub dev_api_url: String,
    pub prod_api_url: String,
    /// Mock 数据源每次调用的模拟延迟
    pub mock_latency_ms: u64,
    pub request_timeout_secs: u64,
    /// WebSocket 房间服务端口
    pub realtime_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mock,
            environment: Environment::Development,
            dev_api_url: "http://localhost:3000/api".to_string(),
            prod_api_url: "https://api.example.com/api".to_string(),
            mock_latency_ms: 500,
            request_timeout_secs: 10,
            realtime_port: 3001,
        }
    }
}

const PREFIX: &str = "TASKBOARD_";

impl AppConfig {
    /// 从 YAML 文件读取，缺失字段取默认值
    pub fn load(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        let config: AppConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// 默认值叠加环境变量
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::default().merge_env(std::env::vars())
    }

    /// 用 `TASKBOARD_*` 变量覆盖当前配置；未知的 `TASKBOARD_*` 键被忽略
    pub fn merge_env(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(k, v)| k.strip_prefix(PREFIX).map(|s| (s.to_lowercase(), v)))
            .collect();

        if let Some(v) = vars.get("backend") {
            self.backend = match v.trim().to_lowercase().as_str() {
                "mock" => BackendKind::Mock,
                "remote" => BackendKind::Remote,
                _ => return Err(invalid("backend", v)),
            };
        }
        if let Some(v) = vars.get("env") {
            self.environment = match v.trim().to_lowercase().as_str() {
                "development" | "dev" => Environment::Development,
                "production" | "prod" => Environment::Production,
                _ => return Err(invalid("env", v)),
            };
        }
        if let Some(v) = vars.get("dev_api_url") {
            self.dev_api_url = v.clone();
        }
        if let Some(v) = vars.get("prod_api_url") {
            self.prod_api_url = v.clone();
        }
        if let Some(v) = vars.get("mock_latency_ms") {
            self.mock_latency_ms = parse_number("mock_latency_ms", v)?;
        }
        if let Some(v) = vars.get("request_timeout_secs") {
            self.request_timeout_secs = parse_number("request_timeout_secs", v)?;
        }
        if let Some(v) = vars.get("ws_port") {
            self.realtime_port = parse_number("ws_port", v)?;
        }
        Ok(self)
    }

    /// 按运行环境选择 API 地址
    pub fn api_url(&self) -> &str {
        match self.environment {
            Environment::Development => &self.dev_api_url,
            Environment::Production => &self.prod_api_url,
        }
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn invalid(field: &str, value: &str) -> crate::error::TaskboardError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("无法识别的值 '{}'", value),
    }
    .into()
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| invalid(field, value))
}
