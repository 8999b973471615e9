//! Streaming-related error types.
//!
//! Errors that occur while an NDJSON agent stream is open. These are not
//! propagated through the event stream as `Err` items; the ingestor folds
//! them into a single terminal `Error` event so the consumer sees one
//! uniform shape.

use std::fmt;

/// Stream-specific error variants.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// Stream connection was lost unexpectedly.
    ConnectionLost {
        message: String,
    },

    /// The initial streaming request was rejected with an HTTP status.
    HttpStatus {
        status: u16,
        message: String,
    },

    /// The stream produced no readable records at all.
    Unreadable {
        message: String,
    },

    /// Backend reported an error via a stream record.
    BackendError {
        message: String,
    },
}

impl StreamError {
    /// Check if re-opening a fresh stream is likely to succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::ConnectionLost { .. } => true,
            StreamError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            StreamError::Unreadable { .. } => false,
            StreamError::BackendError { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::ConnectionLost { .. } => {
                "Connection to the assistant was lost. Please try again.".to_string()
            }
            StreamError::HttpStatus { status, .. } => {
                format!("The assistant is unavailable (HTTP {}). Please try again.", status)
            }
            StreamError::Unreadable { .. } => {
                "Received unreadable data from the assistant. Please try again.".to_string()
            }
            StreamError::BackendError { message } => {
                format!("Assistant error: {}", message)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::HttpStatus { .. } => "E_STREAM_HTTP",
            StreamError::Unreadable { .. } => "E_STREAM_UNREADABLE",
            StreamError::BackendError { .. } => "E_STREAM_BACKEND",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionLost { message } => {
                write!(f, "Stream connection lost: {}", message)
            }
            StreamError::HttpStatus { status, message } => {
                write!(f, "Stream rejected (HTTP {}): {}", status, message)
            }
            StreamError::Unreadable { message } => {
                write!(f, "Unreadable stream: {}", message)
            }
            StreamError::BackendError { message } => {
                write!(f, "Backend error: {}", message)
            }
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lost_is_retryable() {
        let err = StreamError::ConnectionLost {
            message: "socket closed".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "E_STREAM_CONN");
    }

    #[test]
    fn test_http_status_retryability() {
        let err = StreamError::HttpStatus {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(err.is_retryable());

        let err = StreamError::HttpStatus {
            status: 400,
            message: "bad request".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_backend_error_not_retryable() {
        let err = StreamError::BackendError {
            message: "agent crashed".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("agent crashed"));
    }

    #[test]
    fn test_display_format() {
        let err = StreamError::HttpStatus {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Stream rejected (HTTP 503): unavailable");
    }
}
