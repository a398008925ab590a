//! Minimal Elasticsearch HTTP client for the transfer pipelines.
//!
//! Covers exactly the three capabilities the pipelines need: connect with
//! optional credentials, scroll-paginated read of an index, and
//! single-document writes. Uses async reqwest internally behind a shared
//! tokio runtime, presenting a sync interface to the callers.

pub mod client;
pub mod error;
mod http;
pub mod scroll;

pub use client::{ConnectOptions, EsClient};
pub use error::ClientError;
pub use scroll::{Hit, Scroll, TotalHits};
