use serde::{Deserialize, Serialize};

use super::RawMessage;

/// Lifecycle status of a stored thread.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    #[default]
    Active,
    Waiting,
    Closed,
}

/// The `value` payload of a thread document in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ThreadValue {
    /// Ordered messages of the conversation
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    /// Thread lifecycle status
    #[serde(default)]
    pub status: ThreadStatus,
    /// Agent that owns this thread
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// A thread document as returned by the store's search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadDocument {
    /// Store-assigned identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Thread payload
    #[serde(default)]
    pub value: ThreadValue,
    /// Registration metadata (agent id, user id, brand extras)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Response of `POST /document` (thread registration).
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentCreateResponse {
    /// Store-level success flag
    #[serde(default)]
    pub status: bool,
    /// Created document, present on success
    #[serde(default)]
    pub data: Option<ThreadDocument>,
}

/// Response of `POST /document/search` (history lookup).
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSearchResponse {
    /// Store-level success flag
    #[serde(default)]
    pub status: bool,
    /// Matching documents, at most one for an id lookup
    #[serde(default)]
    pub data: Vec<ThreadDocument>,
}
