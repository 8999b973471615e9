//! Error handling for the streaming chat pipeline.
//!
//! Errors are split by domain, mirroring how they are handled:
//!
//! - [`ConfigError`] - missing configuration; fatal to the operation.
//! - [`NetworkError`] - transport failures on plain request/response calls;
//!   recovered locally by the caller (empty history, blocked session).
//! - [`StreamError`] - failures on an open NDJSON stream; surfaced to the
//!   consumer as a single terminal `Error` event, never unwound through it.
//!
//! The store client wraps these in [`crate::machina::MachinaError`]. Each
//! domain error exposes `is_retryable`, `user_message` and `error_code` so
//! callers can make handling decisions without matching every variant.

mod network;
mod stream;

pub use network::NetworkError;
pub use stream::StreamError;

use thiserror::Error;

/// Configuration errors detected before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No backend base URL is configured.
    #[error("Backend base URL is not configured")]
    MissingBaseUrl,
}
