//! Trait abstractions for injectable dependencies.
//!
//! The HTTP seam lets the store client and stream ingestor run against the
//! production reqwest adapter or the in-crate mock in tests.

mod http;

pub use http::{Headers, HttpClient, HttpError, Response};
