//! Machina document-store client.
//!
//! Covers the two non-streaming backend operations: registering a new
//! conversation thread (`POST /document`) and looking up a thread's message
//! history (`POST /document/search`). Streaming turns live in
//! [`crate::stream`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::brand::Brand;
use crate::config::BackendConfig;
use crate::error::{ConfigError, NetworkError};
use crate::models::{DocumentCreateResponse, DocumentSearchResponse, RawMessage};
use crate::traits::{Headers, HttpClient, HttpError};

/// Error type for store client operations.
#[derive(Debug)]
pub enum MachinaError {
    /// Configuration missing before any request was issued
    Config(ConfigError),
    /// Transport-level failure
    Network(NetworkError),
    /// Response body did not decode
    Json(serde_json::Error),
    /// The store answered but reported failure
    StoreRejected { operation: &'static str },
}

impl std::fmt::Display for MachinaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachinaError::Config(e) => write!(f, "Configuration error: {}", e),
            MachinaError::Network(e) => write!(f, "Network error: {}", e),
            MachinaError::Json(e) => write!(f, "JSON error: {}", e),
            MachinaError::StoreRejected { operation } => {
                write!(f, "Store rejected {} request", operation)
            }
        }
    }
}

impl std::error::Error for MachinaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MachinaError::Config(e) => Some(e),
            MachinaError::Network(e) => Some(e),
            MachinaError::Json(e) => Some(e),
            MachinaError::StoreRejected { .. } => None,
        }
    }
}

impl From<ConfigError> for MachinaError {
    fn from(e: ConfigError) -> Self {
        MachinaError::Config(e)
    }
}

impl From<NetworkError> for MachinaError {
    fn from(e: NetworkError) -> Self {
        MachinaError::Network(e)
    }
}

impl From<serde_json::Error> for MachinaError {
    fn from(e: serde_json::Error) -> Self {
        MachinaError::Json(e)
    }
}

/// Client for the Machina document store.
pub struct MachinaClient<C: HttpClient> {
    http: Arc<C>,
    config: BackendConfig,
}

impl<C: HttpClient> MachinaClient<C> {
    /// Create a client over the given HTTP client and backend config.
    pub fn new(http: Arc<C>, config: BackendConfig) -> Self {
        Self { http, config }
    }

    /// The active brand.
    pub fn brand(&self) -> Brand {
        self.config.brand
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(token) = &self.config.api_token {
            headers.insert("X-Api-Token".to_string(), token.clone());
        }
        headers
    }

    async fn post_json(&self, url: &str, body: String) -> Result<bytes::Bytes, MachinaError> {
        let response = self
            .http
            .post(url, &body, &self.headers())
            .await
            .map_err(|e| MachinaError::Network(convert_http_error(url, e)))?;

        if !response.is_success() {
            return Err(MachinaError::Network(NetworkError::HttpStatus {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }));
        }

        Ok(response.body)
    }

    /// Register a new conversation thread.
    ///
    /// Creates a thread document with `status: active`, seeded with the
    /// brand's assistant welcome message. Every call creates a new thread;
    /// the backend has no dedupe, so sessions guard against double
    /// registration locally (see [`crate::session::ChatSession`]).
    ///
    /// On failure the caller must not proceed to load history or open a
    /// stream for this session.
    pub async fn register_thread(
        &self,
        user_id: &str,
        metadata: serde_json::Value,
    ) -> Result<String, MachinaError> {
        let base_url = self.config.require_base_url()?;
        let url = format!("{}/document", base_url);
        let brand = self.config.brand;

        let mut doc_metadata = json!({
            "agent_id": brand.agent_id(),
            "user_id": user_id,
            "created_at": Utc::now().to_rfc3339(),
        });
        if let (Some(target), Some(extra)) = (doc_metadata.as_object_mut(), metadata.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }

        let body = json!({
            "name": "thread",
            "metadata": doc_metadata,
            "value": {
                "messages": [{
                    "role": "assistant",
                    "content": self.config.welcome_message(),
                    "timestamp": Utc::now().to_rfc3339(),
                }],
                "status": "active",
                "agent_id": brand.agent_id(),
            }
        });

        let response_body = self.post_json(&url, body.to_string()).await?;
        let response: DocumentCreateResponse = serde_json::from_slice(&response_body)?;

        match response.data {
            Some(document) if response.status => {
                info!(thread_id = %document.id, "registered thread");
                Ok(document.id)
            }
            _ => {
                warn!("store rejected thread registration");
                Err(MachinaError::StoreRejected {
                    operation: "register",
                })
            }
        }
    }

    /// Fetch the persisted message history for a thread.
    ///
    /// Performs an id lookup through the search endpoint with caching
    /// disabled, so a just-registered thread's seed message is visible
    /// immediately and reloads observe prior turns.
    pub async fn fetch_history(&self, thread_id: &str) -> Result<Vec<RawMessage>, MachinaError> {
        let base_url = self.config.require_base_url()?;
        let url = format!("{}/document/search", base_url);

        let body = json!({
            "filters": { "_id": thread_id },
            "page": 1,
            "page_size": 1,
        });

        let response_body = self.post_json(&url, body.to_string()).await?;
        let response: DocumentSearchResponse = serde_json::from_slice(&response_body)?;

        if !response.status {
            return Err(MachinaError::StoreRejected {
                operation: "history",
            });
        }

        match response.data.into_iter().next() {
            Some(document) => Ok(document.value.messages),
            None => {
                warn!(thread_id, "thread not found in store");
                Err(MachinaError::StoreRejected {
                    operation: "history",
                })
            }
        }
    }
}

fn convert_http_error(url: &str, err: HttpError) -> NetworkError {
    match err {
        HttpError::ConnectionFailed(message) => NetworkError::ConnectionFailed {
            url: url.to_string(),
            message,
        },
        HttpError::Timeout(_) => NetworkError::Timeout {
            operation: "store request".to_string(),
        },
        HttpError::ServerError { status, message } => NetworkError::HttpStatus { status, message },
        HttpError::Io(message) | HttpError::Other(message) => NetworkError::Other { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;

    fn test_config() -> BackendConfig {
        BackendConfig::new("https://api.example.com")
            .with_api_token("secret")
            .with_brand(Brand::Sportingbet)
    }

    fn client_with(
        url: &str,
        response: MockResponse,
    ) -> (Arc<MockHttpClient>, MachinaClient<MockHttpClient>) {
        let http = Arc::new(MockHttpClient::new());
        http.set_response(url, response);
        let client = MachinaClient::new(http.clone(), test_config());
        (http, client)
    }

    #[tokio::test]
    async fn test_register_thread_success() {
        let (http, client) = client_with(
            "https://api.example.com/document",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"{"status":true,"data":{"_id":"thread-123"}}"#),
            )),
        );

        let thread_id = client
            .register_thread("user-1", json!({"event_code": "cwc"}))
            .await
            .unwrap();
        assert_eq!(thread_id, "thread-123");

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get("X-Api-Token"),
            Some(&"secret".to_string())
        );

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["name"], "thread");
        assert_eq!(body["metadata"]["agent_id"], "sportingbot-chat-assistant");
        assert_eq!(body["metadata"]["user_id"], "user-1");
        assert_eq!(body["metadata"]["event_code"], "cwc");
        assert_eq!(body["value"]["status"], "active");
        // Seed message is the brand welcome
        assert_eq!(body["value"]["messages"][0]["role"], "assistant");
        assert_eq!(
            body["value"]["messages"][0]["content"],
            Brand::Sportingbet.welcome_message()
        );
    }

    #[tokio::test]
    async fn test_register_unknown_brand_seeds_generic_welcome() {
        let http = Arc::new(MockHttpClient::new());
        http.set_response(
            "https://api.example.com/document",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"{"status":true,"data":{"_id":"thread-1"}}"#),
            )),
        );
        let config = BackendConfig::new("https://api.example.com").with_brand_id("tyltyhub");
        let client = MachinaClient::new(http.clone(), config);

        client.register_thread("user-1", json!({})).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&http.requests()[0].body).unwrap();
        assert_eq!(
            body["value"]["messages"][0]["content"],
            Brand::fallback_welcome_message()
        );
        // Agent resolution still falls back to the default brand
        assert_eq!(body["metadata"]["agent_id"], "botandwin-chat-assistant");
    }

    #[tokio::test]
    async fn test_register_thread_store_rejection() {
        let (_http, client) = client_with(
            "https://api.example.com/document",
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"status":false}"#))),
        );

        let result = client.register_thread("user-1", json!({})).await;
        assert!(matches!(
            result,
            Err(MachinaError::StoreRejected {
                operation: "register"
            })
        ));
    }

    #[tokio::test]
    async fn test_register_thread_missing_base_url() {
        let http = Arc::new(MockHttpClient::new());
        let client = MachinaClient::new(http.clone(), BackendConfig::default());

        let result = client.register_thread("user-1", json!({})).await;
        assert!(matches!(
            result,
            Err(MachinaError::Config(ConfigError::MissingBaseUrl))
        ));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_register_thread_http_failure() {
        let (_http, client) = client_with(
            "https://api.example.com/document",
            MockResponse::Success(Response::new(500, Bytes::from("boom"))),
        );

        let result = client.register_thread("user-1", json!({})).await;
        match result {
            Err(MachinaError::Network(NetworkError::HttpStatus { status, .. })) => {
                assert_eq!(status, 500)
            }
            other => panic!("Expected HttpStatus error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_history_success() {
        let (http, client) = client_with(
            "https://api.example.com/document/search",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(
                    r#"{"status":true,"data":[{"_id":"thread-123","value":{"messages":[
                        {"role":"assistant","content":"Welcome"},
                        {"role":"user","content":"Hi"}
                    ],"status":"active"}}]}"#,
                ),
            )),
        );

        let messages = client.fetch_history("thread-123").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].display_text(), "Welcome");

        let body: serde_json::Value = serde_json::from_str(&http.requests()[0].body).unwrap();
        assert_eq!(body["filters"]["_id"], "thread-123");
        assert_eq!(body["page_size"], 1);
    }

    #[tokio::test]
    async fn test_fetch_history_thread_not_found() {
        let (_http, client) = client_with(
            "https://api.example.com/document/search",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"{"status":true,"data":[]}"#),
            )),
        );

        let result = client.fetch_history("missing-thread").await;
        assert!(matches!(
            result,
            Err(MachinaError::StoreRejected {
                operation: "history"
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_history_malformed_response() {
        let (_http, client) = client_with(
            "https://api.example.com/document/search",
            MockResponse::Success(Response::new(200, Bytes::from("not json"))),
        );

        let result = client.fetch_history("thread-123").await;
        assert!(matches!(result, Err(MachinaError::Json(_))));
    }

    #[tokio::test]
    async fn test_fetch_history_network_error() {
        let (_http, client) = client_with(
            "https://api.example.com/document/search",
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );

        let result = client.fetch_history("thread-123").await;
        assert!(matches!(
            result,
            Err(MachinaError::Network(NetworkError::ConnectionFailed { .. }))
        ));
    }
}
