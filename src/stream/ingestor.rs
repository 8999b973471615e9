//! Opens the per-turn streaming request and adapts raw bytes to events.
//!
//! One streaming POST is issued per user turn. The ingestor never yields
//! `Err` items: transport and protocol failures are folded into a single
//! terminal [`StreamEvent::Error`] so the consumer handles one uniform event
//! shape. Dropping the returned stream cancels consumption; there is no
//! resume capability, a retry is a fresh stream.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::error::StreamError;
use crate::models::StreamRequest;
use crate::traits::{Headers, HttpClient, HttpError};

use super::{NdjsonParser, StreamEvent};

/// A live, cancelable sequence of stream events for one user turn.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Opens NDJSON streams against the brand-resolved agent endpoint.
pub struct StreamIngestor<C: HttpClient> {
    http: Arc<C>,
    config: BackendConfig,
}

impl<C: HttpClient + 'static> StreamIngestor<C> {
    /// Create an ingestor over the given HTTP client and backend config.
    pub fn new(http: Arc<C>, config: BackendConfig) -> Self {
        Self { http, config }
    }

    /// Open a stream for one user turn.
    ///
    /// The returned stream yields events in arrival order and ends after the
    /// first terminal event. A rejected or unreachable endpoint yields a
    /// single synthesized `Error` event rather than failing the call.
    pub async fn open(&self, thread_id: &str, user_text: &str) -> EventStream {
        let base_url = match self.config.require_base_url() {
            Ok(url) => url.to_string(),
            Err(err) => {
                warn!(error = %err, "stream rejected before request");
                return single_error(err.to_string());
            }
        };

        let url = format!("{}/agent/stream/{}", base_url, self.config.brand.agent_id());
        let request = StreamRequest::for_turn(thread_id, user_text);
        let body = match serde_json::to_string(&request) {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "failed to encode stream request");
                return single_error(format!("Failed to encode request: {}", err));
            }
        };

        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/x-ndjson".to_string());
        if let Some(token) = &self.config.api_token {
            headers.insert("X-Api-Token".to_string(), token.clone());
        }

        info!(thread_id, url = %url, "opening agent stream");

        let bytes_stream = match self.http.post_stream(&url, &body, &headers).await {
            Ok(stream) => stream,
            Err(HttpError::ServerError { status, message }) => {
                let err = StreamError::HttpStatus { status, message };
                warn!(code = err.error_code(), %err, "agent stream rejected");
                return single_error(format!("Backend error: {}", status));
            }
            Err(err) => {
                warn!(error = %err, "agent stream failed to open");
                return single_error(
                    StreamError::ConnectionLost {
                        message: err.to_string(),
                    }
                    .user_message(),
                );
            }
        };

        Box::pin(decode_events(bytes_stream))
    }
}

/// A stream carrying exactly one synthesized terminal error event.
fn single_error(message: String) -> EventStream {
    Box::pin(stream::iter(vec![StreamEvent::Error { message }]))
}

/// Decode a byte stream into events, enforcing single-terminal semantics:
/// the stream ends right after the first `Done`/`Error`, and a transport
/// failure mid-stream becomes the terminal `Error` event.
fn decode_events(
    bytes_stream: Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>,
) -> impl Stream<Item = StreamEvent> + Send {
    struct DecodeState {
        inner: Option<Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>>,
        parser: NdjsonParser,
        pending: std::collections::VecDeque<StreamEvent>,
    }

    let state = DecodeState {
        inner: Some(bytes_stream),
        parser: NdjsonParser::new(),
        pending: std::collections::VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                if event.is_terminal() {
                    // Anything after a terminal event is dropped
                    if !state.pending.is_empty() {
                        debug!(
                            dropped = state.pending.len(),
                            "dropping events after terminal"
                        );
                    }
                    state.inner = None;
                    state.pending.clear();
                }
                return Some((event, state));
            }

            let inner = state.inner.as_mut()?;
            match inner.next().await {
                Some(Ok(chunk)) => {
                    let events = state.parser.feed(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(err)) => {
                    warn!(error = %err, "agent stream transport failure");
                    state.inner = None;
                    state.pending.clear();
                    state.pending.push_back(StreamEvent::Error {
                        message: StreamError::ConnectionLost {
                            message: err.to_string(),
                        }
                        .user_message(),
                    });
                }
                None => {
                    state.inner = None;
                    if let Some(event) = state.parser.finish() {
                        state.pending.push_back(event);
                    }
                    if state.pending.is_empty() {
                        return None;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::brand::Brand;

    fn test_config() -> BackendConfig {
        BackendConfig::new("https://api.example.com")
            .with_api_token("test-token")
            .with_brand(Brand::Sportingbet)
    }

    fn ndjson_chunks(lines: &[&str]) -> Vec<Bytes> {
        lines
            .iter()
            .map(|line| Bytes::from(format!("{}\n", line)))
            .collect()
    }

    #[tokio::test]
    async fn test_open_streams_events_in_order() {
        let http = Arc::new(MockHttpClient::new());
        http.set_response(
            "https://api.example.com/agent/stream/",
            MockResponse::Stream(ndjson_chunks(&[
                r#"{"type":"token","content":"A"}"#,
                r#"{"type":"token","content":"B"}"#,
                r#"{"type":"done"}"#,
            ])),
        );

        let ingestor = StreamIngestor::new(http.clone(), test_config());
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StreamEvent::Token {
                text: "A".to_string()
            }
        );
        assert_eq!(events[2], StreamEvent::Done);
    }

    #[tokio::test]
    async fn test_open_targets_brand_agent() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::Stream(ndjson_chunks(&[r#"{"type":"done"}"#])));

        let ingestor = StreamIngestor::new(http.clone(), test_config());
        let _: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://api.example.com/agent/stream/sportingbot-chat-assistant"
        );
        assert_eq!(
            requests[0].headers.get("X-Api-Token"),
            Some(&"test-token".to_string())
        );

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["context-agent"]["thread_id"], "thread-1");
        assert_eq!(body["context-agent"]["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn test_http_rejection_synthesizes_single_error() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::Error(HttpError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        }));

        let ingestor = StreamIngestor::new(http, test_config());
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(
            events,
            vec![StreamEvent::Error {
                message: "Backend error: 503".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_base_url_synthesizes_error() {
        let http = Arc::new(MockHttpClient::new());
        let config = BackendConfig::default();

        let ingestor = StreamIngestor::new(http.clone(), config);
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
        // No request was issued
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_becomes_terminal_error() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::StreamThenError(
            ndjson_chunks(&[r#"{"type":"token","content":"partial"}"#]),
            HttpError::Io("connection reset".to_string()),
        ));

        let ingestor = StreamIngestor::new(http, test_config());
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            StreamEvent::Token {
                text: "partial".to_string()
            }
        );
        assert!(matches!(events[1], StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_events_after_terminal_are_dropped() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::Stream(ndjson_chunks(&[
            r#"{"type":"token","content":"A"}"#,
            r#"{"type":"done"}"#,
            r#"{"type":"token","content":"ghost"}"#,
        ])));

        let ingestor = StreamIngestor::new(http, test_config());
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[1], StreamEvent::Done);
    }

    #[tokio::test]
    async fn test_unterminated_final_record_is_flushed() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::Stream(vec![
            Bytes::from("{\"type\":\"token\",\"content\":\"A\"}\n"),
            Bytes::from("{\"type\":\"done\"}"),
        ]));

        let ingestor = StreamIngestor::new(http, test_config());
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[1], StreamEvent::Done);
    }

    #[tokio::test]
    async fn test_stream_without_terminal_just_ends() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::Stream(ndjson_chunks(&[
            r#"{"type":"token","content":"A"}"#,
        ])));

        let ingestor = StreamIngestor::new(http, test_config());
        let events: Vec<_> = ingestor.open("thread-1", "hello").await.collect().await;

        assert_eq!(events.len(), 1);
        assert!(!events[0].is_terminal());
    }
}
