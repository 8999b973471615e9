//! NDJSON agent stream handling.
//!
//! The agent answers each user turn with a newline-delimited JSON body: one
//! independently parseable record per line, each carrying a `type`
//! discriminator. Records never align with network packet boundaries, so the
//! parser buffers partial lines across reads.
//!
//! # Module structure
//! - `events` - Typed stream events (StreamEvent)
//! - `parser` - Incremental NDJSON parsing (NdjsonParser)
//! - `ingestor` - Opens the streaming request and adapts bytes to events

mod events;
mod ingestor;
mod parser;

pub use events::StreamEvent;
pub use ingestor::{EventStream, StreamIngestor};
pub use parser::NdjsonParser;
