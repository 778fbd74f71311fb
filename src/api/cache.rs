//! ETag-validated fetch cache.

use super::ApiError;

use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Validator and payload of the last 200 that carried an ETag.
///
/// Kept in one entry so the two are always written together.
#[derive(Debug, Clone)]
struct CacheEntry {
    etag: String,
    payload: Value,
}

/// HTTP client that revalidates every endpoint with `If-None-Match`.
///
/// Entries are keyed by endpoint, not by query parameters, and never expire:
/// freshness is decided by the server.
pub struct FetchCache {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl FetchCache {
    /// Create a cache against `base_url` (no trailing slash needed).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Fetch `endpoint` and return its decoded payload.
    pub async fn fetch(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.fetch_with_query(endpoint, &[]).await
    }

    /// Fetch `endpoint` with query parameters. Parameters are not part of the cache key.
    pub async fn fetch_with_query(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut request = self.client.get(&url).query(params);
        if let Some(etag) = self.etag(endpoint).await {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_MODIFIED => {
                tracing::debug!("Cache hit for {}", endpoint);
                self.cached(endpoint).await.ok_or_else(|| ApiError::CacheMiss {
                    endpoint: endpoint.to_string(),
                })
            }
            StatusCode::OK => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                let body = response
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Network(e.to_string()))?;

                let payload: Value = serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
                    endpoint: endpoint.to_string(),
                    source,
                })?;

                if let Some(etag) = etag {
                    let mut entries = self.entries.write().await;
                    entries.insert(
                        endpoint.to_string(),
                        CacheEntry {
                            etag,
                            payload: payload.clone(),
                        },
                    );
                }

                Ok(payload)
            }
            status => Err(ApiError::Request {
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }

    /// The validator last stored for `endpoint`.
    pub async fn etag(&self, endpoint: &str) -> Option<String> {
        self.entries.read().await.get(endpoint).map(|e| e.etag.clone())
    }

    /// The payload last stored for `endpoint`.
    pub async fn cached(&self, endpoint: &str) -> Option<Value> {
        self.entries.read().await.get(endpoint).map(|e| e.payload.clone())
    }
}
