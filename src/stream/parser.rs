//! Incremental NDJSON parsing.
//!
//! Network chunks carry arbitrary slices of the reply body, so a record may
//! arrive split across several reads or share a read with its neighbors. The
//! parser appends raw bytes to an internal buffer, scans for newline
//! boundaries, and decodes each complete line independently. Splitting at
//! `\n` is UTF-8 safe (continuation bytes never equal `0x0A`), so a
//! multi-byte character broken across reads is reassembled before decoding.
//!
//! Malformed lines are skipped with a warning and the stream continues;
//! records with an unknown `type` discriminator are skipped at debug level.

use tracing::{debug, warn};

use super::StreamEvent;

/// Stateful NDJSON parser that accumulates bytes and emits complete events.
#[derive(Debug, Default)]
pub struct NdjsonParser {
    /// Bytes of the current incomplete line
    buffer: Vec<u8>,
}

impl NdjsonParser {
    /// Create a new NDJSON parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            // Drop the trailing \n (and a preceding \r for CRLF bodies)
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if let Some(event) = Self::parse_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was never newline-terminated.
    ///
    /// Call once when the byte stream ends; some backends omit the final
    /// newline after the `done` record.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line)
    }

    /// Decode a single line into an event.
    ///
    /// Returns `None` for blank lines, malformed JSON and unknown record
    /// types; the caller keeps consuming the stream in all three cases.
    fn parse_line(line: &[u8]) -> Option<StreamEvent> {
        let text = String::from_utf8_lossy(line);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "skipping malformed stream line");
                return None;
            }
        };

        let record_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();
        match record_type.as_str() {
            "token" | "objects" | "suggestions" | "error" | "done" => {
                match serde_json::from_value::<StreamEvent>(value) {
                    Ok(event) => Some(event),
                    Err(err) => {
                        warn!(record_type = %record_type, error = %err, "skipping malformed stream record");
                        None
                    }
                }
            }
            other => {
                debug!(record_type = %other, "ignoring unknown stream record type");
                None
            }
        }
    }
}
