//! Data model for threads, messages and stream requests.

mod message;
mod request;
mod thread;

pub use message::{Message, MessageRole, RawContent, RawMessage};
pub use request::{OutboundMessage, StreamRequest, ThreadContext};
pub use thread::{
    DocumentCreateResponse, DocumentSearchResponse, ThreadDocument, ThreadStatus, ThreadValue,
};
