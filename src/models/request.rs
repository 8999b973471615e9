use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A message as sent to the agent streaming endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

impl OutboundMessage {
    /// Build a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Thread context nested in the stream request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadContext {
    pub thread_id: String,
    pub messages: Vec<OutboundMessage>,
}

/// Request body for `POST /agent/stream/{agent_id}`.
///
/// The backend expects the thread context nested under a `context-agent` key;
/// only the newest user message is forwarded, the backend replays the rest
/// from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRequest {
    pub stream_workflows: bool,
    #[serde(rename = "context-agent")]
    pub context_agent: ThreadContext,
}

impl StreamRequest {
    /// Build a request carrying one new user message for a thread.
    pub fn for_turn(thread_id: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            stream_workflows: false,
            context_agent: ThreadContext {
                thread_id: thread_id.into(),
                messages: vec![OutboundMessage::user(user_text)],
            },
        }
    }
}
