//! Stream event types.
//!
//! Typed events decoded from the agent's NDJSON reply stream.

use serde::{Deserialize, Serialize};

/// Typed events from the agent streaming endpoint.
///
/// Events arrive in order; `Done` and `Error` are terminal and at most one
/// terminal event is emitted per stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Text chunk to append to the in-progress assistant message
    Token {
        #[serde(rename = "content")]
        text: String,
    },
    /// Structured objects attached to the in-progress message
    Objects {
        payload: Vec<serde_json::Value>,
    },
    /// Follow-up suggestions attached to the in-progress message
    Suggestions {
        payload: Vec<String>,
    },
    /// Backend or transport failure; terminal
    Error {
        #[serde(rename = "content")]
        message: String,
    },
    /// Stream completed successfully; terminal
    Done,
}

impl StreamEvent {
    /// Returns the event type name as a string for logging purposes.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            StreamEvent::Token { .. } => "token",
            StreamEvent::Objects { .. } => "objects",
            StreamEvent::Suggestions { .. } => "suggestions",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Done => "done",
        }
    }

    /// Whether this event closes the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}
