use std::fmt;

/// taskboard 的统一错误类型
#[derive(Debug)]
pub enum TaskboardError {
    /// 服务层错误（数据源、未实现、取消）
    Service(ServiceError),
    /// 输入校验错误
    Validation(ValidationError),
    /// 鉴权错误
    Auth(AuthError),
    /// HTTP 传输错误
    Transport(TransportError),
    /// 配置错误
    Config(ConfigError),
    /// IO 错误
    Io(std::io::Error),
    /// 其他错误
    Other(String),
}

/// 服务层错误
#[derive(Debug)]
pub enum ServiceError {
    /// 目标实体不存在
    NotFound { entity: &'static str, id: String },
    /// 数据源暂时不可用（连接失败、超时、网关错误）
    Unavailable(String),
    /// 该路径尚未接通
    NotImplemented(String),
    /// 调用被取消
    Cancelled,
}

/// 输入校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 必填字段为空
    MissingField(String),
    /// 数值超出允许范围
    OutOfRange { field: String, message: String },
    /// 字段值无效
    InvalidValue { field: String, message: String },
}

/// 鉴权错误
#[derive(Debug)]
pub enum AuthError {
    /// 用户名或密码错误
    InvalidCredentials,
    /// 未登录，缺少 token
    MissingToken,
    /// token 无效或已过期
    InvalidToken,
}

/// HTTP 传输错误
#[derive(Debug)]
pub enum TransportError {
    /// 网络请求失败
    NetworkError(String),
    /// API 返回错误状态码
    ApiError { status: u16, message: String },
    /// 响应格式无效
    InvalidResponse(String),
    /// 序列化/反序列化错误
    SerializationError(String),
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
    /// 配置值无效
    InvalidValue { field: String, message: String },
}

/// 错误大类，供调用方（UI、CLI、传输边界）按类别处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Unauthorized,
    Unavailable,
    NotImplemented,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Unavailable => "UNAVAILABLE",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::Cancelled => "CANCELLED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl TaskboardError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
        .into()
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        ValidationError::MissingField(field.into()).into()
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskboardError::Service(e) => match e {
                ServiceError::NotFound { .. } => ErrorKind::NotFound,
                ServiceError::Unavailable(_) => ErrorKind::Unavailable,
                ServiceError::NotImplemented(_) => ErrorKind::NotImplemented,
                ServiceError::Cancelled => ErrorKind::Cancelled,
            },
            TaskboardError::Validation(_) => ErrorKind::Validation,
            TaskboardError::Auth(_) => ErrorKind::Unauthorized,
            TaskboardError::Transport(_)
            | TaskboardError::Config(_)
            | TaskboardError::Io(_)
            | TaskboardError::Other(_) => ErrorKind::Internal,
        }
    }
}

// 实现 Display trait
impl fmt::Display for TaskboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskboardError::Service(e) => write!(f, "Service Error: {}", e),
            TaskboardError::Validation(e) => write!(f, "Validation Error: {}", e),
            TaskboardError::Auth(e) => write!(f, "Auth Error: {}", e),
            TaskboardError::Transport(e) => write!(f, "Transport Error: {}", e),
            TaskboardError::Config(e) => write!(f, "Config Error: {}", e),
            TaskboardError::Io(e) => write!(f, "IO Error: {}", e),
            TaskboardError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound { entity, id } => write!(f, "{} not found: {}", entity, id),
            ServiceError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ServiceError::NotImplemented(what) => write!(f, "Not implemented: {}", what),
            ServiceError::Cancelled => write!(f, "Call cancelled"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{} is required", field),
            ValidationError::OutOfRange { field, message } => {
                write!(f, "'{}' out of range: {}", field, message)
            }
            ValidationError::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingToken => write!(f, "Not signed in"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            TransportError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            TransportError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            TransportError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid config value for '{}': {}", field, message)
            }
        }
    }
}

// 实现 std::error::Error trait
impl std::error::Error for TaskboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TaskboardError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ServiceError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for AuthError {}
impl std::error::Error for TransportError {}
impl std::error::Error for ConfigError {}

// From 转换实现
impl From<std::io::Error> for TaskboardError {
    fn from(err: std::io::Error) -> Self {
        TaskboardError::Io(err)
    }
}

impl From<reqwest::Error> for TaskboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Unavailable("Request timeout".to_string()).into()
        } else if err.is_connect() {
            ServiceError::Unavailable(format!("Connection failed: {}", err)).into()
        } else if err.is_decode() {
            TransportError::InvalidResponse(err.to_string()).into()
        } else {
            TransportError::NetworkError(err.to_string()).into()
        }
    }
}

impl From<serde_json::Error> for TaskboardError {
    fn from(err: serde_json::Error) -> Self {
        TaskboardError::Transport(TransportError::SerializationError(err.to_string()))
    }
}

impl From<serde_yaml::Error> for TaskboardError {
    fn from(err: serde_yaml::Error) -> Self {
        TaskboardError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<ServiceError> for TaskboardError {
    fn from(err: ServiceError) -> Self {
        TaskboardError::Service(err)
    }
}

impl From<ValidationError> for TaskboardError {
    fn from(err: ValidationError) -> Self {
        TaskboardError::Validation(err)
    }
}

impl From<AuthError> for TaskboardError {
    fn from(err: AuthError) -> Self {
        TaskboardError::Auth(err)
    }
}

impl From<TransportError> for TaskboardError {
    fn from(err: TransportError) -> Self {
        TaskboardError::Transport(err)
    }
}

impl From<ConfigError> for TaskboardError {
    fn from(err: ConfigError) -> Self {
        TaskboardError::Config(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, TaskboardError>;
