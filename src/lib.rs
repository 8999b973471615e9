//! betstream - streaming chat client for Machina-backed betting assistants
//!
//! Registers conversation threads against the Machina document store,
//! streams NDJSON assistant replies, reconciles persisted history with live
//! streams into one ordered message view, indexes side-channel payloads
//! (betting markets, articles, follow-up suggestions) per message, and
//! rewrites betting deep-link tokens into brand URLs.

pub mod adapters;
pub mod brand;
pub mod config;
pub mod error;
pub mod links;
pub mod machina;
pub mod models;
pub mod reconcile;
pub mod session;
pub mod sidechannel;
pub mod stream;
pub mod traits;
