//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses, errors or byte streams for testing purposes.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful response
    Success(Response),
    /// Return an error
    Error(HttpError),
    /// Return a stream of byte chunks
    Stream(Vec<Bytes>),
    /// Return a stream that fails after the given chunks
    StreamThenError(Vec<Bytes>, HttpError),
}

/// Mock HTTP client for testing.
///
/// Configure responses per URL (exact match first, then prefix match, then a
/// default) and verify the requests that were made.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a URL (exact or prefix match).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose URL contains the given fragment.
    pub fn request_count_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn response_for(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request(url, headers, body);

        match self.response_for(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(error)) => Err(error),
            Some(MockResponse::Stream(_)) | Some(MockResponse::StreamThenError(..)) => {
                Err(HttpError::Other("stream response configured for plain post".to_string()))
            }
            None => Err(HttpError::Other(format!("no mock response for {}", url))),
        }
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>, HttpError> {
        self.record_request(url, headers, body);

        match self.response_for(url) {
            Some(MockResponse::Stream(chunks)) => {
                let items: Vec<Result<Bytes, HttpError>> = chunks.into_iter().map(Ok).collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::StreamThenError(chunks, error)) => {
                let mut items: Vec<Result<Bytes, HttpError>> =
                    chunks.into_iter().map(Ok).collect();
                items.push(Err(error));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::Error(error)) => Err(error),
            Some(MockResponse::Success(_)) => {
                Err(HttpError::Other("plain response configured for stream post".to_string()))
            }
            None => Err(HttpError::Other(format!("no mock response for {}", url))),
        }
    }
}
