//! HTTP 状态码到错误类别的映射
//!
//! 传输边界上保留错误类别，不把所有失败折叠成一个通用 500。

use crate::error::{
    AuthError, Result, ServiceError, TaskboardError, TransportError, ValidationError,
};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;

/// 非 2xx 响应转成对应的错误，2xx 原样返回
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(error_for_status(status.as_u16(), &body))
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    debug!(bytes = text.len(), "收到 API 响应");
    serde_json::from_str(&text).map_err(|e| TransportError::InvalidResponse(e.to_string()).into())
}

pub(crate) fn error_for_status(status: u16, body: &str) -> TaskboardError {
    let message = extract_message(body);
    match status {
        401 | 403 => AuthError::InvalidToken.into(),
        404 => ServiceError::NotFound {
            entity: "Resource",
            id: message,
        }
        .into(),
        400 | 422 => ValidationError::InvalidValue {
            field: "body".to_string(),
            message,
        }
        .into(),
        501 => ServiceError::NotImplemented(message).into(),
        502..=504 => ServiceError::Unavailable(message).into(),
        _ => TransportError::ApiError { status, message }.into(),
    }
}

/// 后端错误体通常是 `{"message": ...}` 或 `{"error": ...}`
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Unauthorized),
            (404, ErrorKind::NotFound),
            (400, ErrorKind::Validation),
            (422, ErrorKind::Validation),
            (501, ErrorKind::NotImplemented),
            (503, ErrorKind::Unavailable),
            (500, ErrorKind::Internal),
        ];
        for (status, kind) in cases {
            assert_eq!(error_for_status(status, "").kind(), kind, "status {}", status);
        }
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(extract_message(r#"{"message":"Server error"}"#), "Server error");
        assert_eq!(extract_message(r#"{"error":"Invalid credentials"}"#), "Invalid credentials");
        assert_eq!(extract_message(" plain text \n"), "plain text");
    }
}
