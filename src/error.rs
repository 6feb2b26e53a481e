//! Error types for Confab.
//!
//! These cover transport and configuration faults only. Directory operations
//! report unmet preconditions through `bool` and `Option` results instead.

use thiserror::Error;

use crate::rpc::ErrorCode;

/// Common error type for Confab.
#[derive(Error, Debug)]
pub enum ConfabError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The peer answered with a protocol error.
    #[error("protocol error ({code}): {message}")]
    Protocol {
        /// Error code sent by the peer.
        code: ErrorCode,
        /// Human-readable message sent by the peer.
        message: String,
    },

    /// The peer answered with something other than what was asked for.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The connection was closed before a response arrived.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias for Confab operations.
pub type Result<T> = std::result::Result<T, ConfabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfabError::Config("port out of range".to_string());
        assert_eq!(err.to_string(), "configuration error: port out of range");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfabError::Validation("name too long".to_string());
        assert_eq!(err.to_string(), "validation error: name too long");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ConfabError::Protocol {
            code: ErrorCode::UnsupportedVersion,
            message: "expected version 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "protocol error (unsupported_version): expected version 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: ConfabError = io_err.into();
        assert!(matches!(err, ConfabError::Io(_)));
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfabError = json_err.into();
        assert!(matches!(err, ConfabError::Json(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(ConfabError::ConnectionClosed)
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
