use std::fmt;

use serde::{Deserialize, Serialize};

/// 面向用户的通用兜底提示
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
/// 网络不可达时的提示
pub const SERVER_UNREACHABLE: &str = "Server not reachable";

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误类别
///
/// 客户端视角的错误分类，均在发起操作的页面内部处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalErrorStatus {
    /// 网络/传输失败 (fetch 被拒绝、连接中断)
    Network,
    /// 后端明确返回失败 (`success: false`、非 2xx 等)
    Backend,
    /// 提交前的客户端校验失败，不会发出任何请求
    Validation,
    /// JSON 解析或序列化失败
    Serialization,
    /// 本地持久化 (localStorage) 读写失败
    Storage,
    /// 登录凭据被拒绝
    Unauthorized,
}

impl PortalErrorStatus {
    pub fn error_code(&self) -> &'static str {
        match self {
            PortalErrorStatus::Network => "NETWORK_ERROR",
            PortalErrorStatus::Backend => "BACKEND_REJECTED",
            PortalErrorStatus::Validation => "INVALID_INPUT",
            PortalErrorStatus::Serialization => "JSON_PARSE_ERROR",
            PortalErrorStatus::Storage => "STORAGE_ERROR",
            PortalErrorStatus::Unauthorized => "UNAUTHORIZED",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSpan {
    /// 操作名称，如 "list", "mutate"
    pub operation: String,
    /// 额外的细节信息，如 endpoint 路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// =========================================================
// 核心错误类型
// =========================================================

/// 门户客户端错误
///
/// - status: 错误类别
/// - message: 错误消息 (后端返回的消息会原样保留)
/// - spans: 调用追踪
#[derive(Debug, Clone, PartialEq)]
pub struct PortalError {
    pub status: PortalErrorStatus,
    pub message: String,
    spans: Vec<ErrorSpan>,
}

impl PortalError {
    pub fn new(status: PortalErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            spans: Vec::new(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PortalErrorStatus::Network, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(PortalErrorStatus::Backend, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(PortalErrorStatus::Validation, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(PortalErrorStatus::Serialization, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(PortalErrorStatus::Storage, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(PortalErrorStatus::Unauthorized, message)
    }

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan {
            operation: operation.into(),
            detail: None,
        });
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan {
            operation: operation.into(),
            detail: Some(detail.into()),
        });
        self
    }

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// 展示给用户的消息
    ///
    /// 后端与校验消息原样展示；网络与解析失败使用固定提示，
    /// 空消息回落到通用提示。
    pub fn user_message(&self) -> String {
        match self.status {
            PortalErrorStatus::Network => SERVER_UNREACHABLE.to_string(),
            PortalErrorStatus::Serialization | PortalErrorStatus::Storage => {
                GENERIC_FAILURE.to_string()
            }
            _ if self.message.trim().is_empty() => GENERIC_FAILURE.to_string(),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for PortalError {}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        PortalError::serialization(e.to_string())
    }
}

impl From<url::ParseError> for PortalError {
    fn from(e: url::ParseError) -> Self {
        PortalError::network(format!("invalid url: {}", e))
    }
}

pub type PortalResult<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_trace() {
        let err = PortalError::backend("Invoice not found")
            .in_op("mutate")
            .in_op_with("endpoint", "invoices/update_status.php");
        assert_eq!(
            err.to_string(),
            "[BACKEND_REJECTED] Invoice not found | trace: mutate -> endpoint(invoices/update_status.php)"
        );
    }

    #[test]
    fn user_message_keeps_backend_text_verbatim() {
        assert_eq!(
            PortalError::backend("Task already completed").user_message(),
            "Task already completed"
        );
        assert_eq!(PortalError::backend("  ").user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn user_message_hides_transport_details() {
        let err = PortalError::network("TypeError: Failed to fetch");
        assert_eq!(err.user_message(), SERVER_UNREACHABLE);
        let err = PortalError::network("failed to create headers: JsValue(TypeError)").in_op("list");
        assert_eq!(err.user_message(), SERVER_UNREACHABLE);
        let err = PortalError::serialization("expected value at line 1 column 1");
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }
}
