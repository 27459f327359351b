//! Error types for the Pingen client

use thiserror::Error;

/// Main error type for all Pingen operations
#[derive(Error, Debug)]
pub enum PingenError {
    /// Bad local input, always detected before any network call
    #[error("{0}")]
    Validation(String),

    /// Missing credentials or unusable configuration
    #[error("{0}")]
    Config(String),

    /// Non-success HTTP status, or a success status with an unusable body
    #[error("{}", format_api_error(.message, .status, .request_id))]
    Api {
        message: String,
        status: u16,
        request_id: Option<String>,
    },

    /// Response body that does not match the expected protocol shape
    #[error("{0}")]
    Protocol(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl PingenError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn api(message: impl Into<String>, status: u16, request_id: Option<String>) -> Self {
        Self::Api {
            message: message.into(),
            status,
            request_id,
        }
    }

    /// True for errors caused by bad local input (usage errors)
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn format_api_error(message: &str, status: &u16, request_id: &Option<String>) -> String {
    match request_id.as_deref() {
        Some(id) if !id.is_empty() => format!("{} (HTTP {}, request_id={})", message, status, id),
        _ => format!("{} (HTTP {})", message, status),
    }
}

/// Result type for Pingen operations
pub type Result<T> = std::result::Result<T, PingenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_without_request_id() {
        let err = PingenError::api("get letter failed", 404, None);
        assert_eq!(err.to_string(), "get letter failed (HTTP 404)");
    }

    #[test]
    fn test_api_error_with_request_id() {
        let err = PingenError::api("create letter failed", 422, Some("req-42".to_string()));
        assert_eq!(
            err.to_string(),
            "create letter failed (HTTP 422, request_id=req-42)"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(PingenError::validation("bad").is_validation());
        assert!(!PingenError::Config("missing".to_string()).is_validation());
    }
}
