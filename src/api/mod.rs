//! Client for the upstream War API.
//!
//! Every request goes through [`FetchCache`], which revalidates with ETags.

mod cache;
mod maps;
mod models;

pub use cache::*;
pub use maps::*;
pub use models::*;

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// API error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {endpoint} failed with status {status}")]
    Request { endpoint: String, status: StatusCode },
    #[error("{endpoint} answered 304 but nothing is cached for it")]
    CacheMiss { endpoint: String },
    #[error("malformed payload from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
}
