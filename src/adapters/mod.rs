//! Adapter implementations for the trait abstractions.
//!
//! - `reqwest_http` - Production HTTP client backed by reqwest
//! - `mock` - Configurable mock HTTP client for tests

pub mod mock;
mod reqwest_http;

pub use reqwest_http::ReqwestHttpClient;
