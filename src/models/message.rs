use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Parse a role string from the store. Unknown roles yield `None` so
    /// callers can skip records this pipeline does not model.
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// Stored message content - either a plain string or a structured object
/// carrying the display text in a `question_answer` (or `content`) field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawContent {
    Text(String),
    Structured(serde_json::Value),
}

impl Default for RawContent {
    fn default() -> Self {
        RawContent::Text(String::new())
    }
}

impl RawContent {
    /// Extract the display text from either content shape.
    pub fn display_text(&self) -> String {
        match self {
            RawContent::Text(text) => text.clone(),
            RawContent::Structured(value) => value
                .get("question_answer")
                .or_else(|| value.get("content"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Message shape as persisted by the document store.
///
/// Side-channel fields live either under a nested `document_content[0]`
/// wrapper or at the message root (older records); both shapes are read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawMessage {
    /// Role string as stored; see [`MessageRole::parse`]
    #[serde(default)]
    pub role: String,
    /// Content of the message (string or structured object)
    #[serde(default)]
    pub content: RawContent,
    /// When the message was stored
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Newer records wrap payloads in a document_content array
    #[serde(default)]
    pub document_content: Option<Vec<serde_json::Value>>,
    /// Root-level objects payload (older records)
    #[serde(default)]
    pub objects: Option<Vec<serde_json::Value>>,
    /// Root-level suggestions payload (older records)
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

impl RawMessage {
    /// Parsed role, `None` for roles this pipeline does not model.
    pub fn role(&self) -> Option<MessageRole> {
        MessageRole::parse(&self.role)
    }

    /// Display text for rendering and reconciliation.
    pub fn display_text(&self) -> String {
        self.content.display_text()
    }

    /// Structured objects attached to this message.
    ///
    /// The `document_content[0]` wrapper takes precedence; root-level
    /// `objects` is the fallback for older records.
    pub fn extract_objects(&self) -> Vec<serde_json::Value> {
        if let Some(wrapper) = self.document_content.as_ref().and_then(|dc| dc.first()) {
            if let Some(objects) = wrapper.get("objects").and_then(|o| o.as_array()) {
                return objects.clone();
            }
        }
        self.objects.clone().unwrap_or_default()
    }

    /// Follow-up suggestions attached to this message, same precedence as
    /// [`RawMessage::extract_objects`].
    pub fn extract_suggestions(&self) -> Vec<String> {
        if let Some(wrapper) = self.document_content.as_ref().and_then(|dc| dc.first()) {
            if let Some(suggestions) = wrapper.get("suggestions").and_then(|s| s.as_array()) {
                return suggestions
                    .iter()
                    .filter_map(|s| s.as_str().map(String::from))
                    .collect();
            }
        }
        self.suggestions.clone().unwrap_or_default()
    }
}

/// A message in the reconciled view of a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Stable per-message key assigned by the reconciler; side-channel
    /// payloads are indexed under this key
    pub key: u64,
    /// Role of the message sender
    pub role: MessageRole,
    /// Finalized content; empty while the message is streaming
    pub content: String,
    /// When the message entered the view
    pub created_at: DateTime<Utc>,
    /// Whether the message is currently being streamed
    #[serde(default)]
    pub is_streaming: bool,
    /// Partial content accumulated during streaming
    #[serde(default)]
    pub partial_content: String,
}

impl Message {
    /// Create a finalized message.
    pub fn finalized(key: u64, role: MessageRole, content: String) -> Self {
        Self {
            key,
            role,
            content,
            created_at: Utc::now(),
            is_streaming: false,
            partial_content: String::new(),
        }
    }

    /// Create a streaming assistant placeholder that accumulates tokens.
    pub fn streaming_placeholder(key: u64) -> Self {
        Self {
            key,
            role: MessageRole::Assistant,
            content: String::new(),
            created_at: Utc::now(),
            is_streaming: true,
            partial_content: String::new(),
        }
    }

    /// Append a token to the partial content during streaming.
    pub fn append_token(&mut self, token: &str) {
        self.partial_content.push_str(token);
    }

    /// Finalize the message with the given content and mark it immutable.
    pub fn finalize_with(&mut self, content: String) {
        if self.is_streaming {
            self.content = content;
            self.partial_content.clear();
            self.is_streaming = false;
        }
    }

    /// Current text: the accumulated partial while streaming, the finalized
    /// content afterwards.
    pub fn text(&self) -> &str {
        if self.is_streaming {
            &self.partial_content
        } else {
            &self.content
        }
    }
}
