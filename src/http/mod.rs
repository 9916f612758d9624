//! HTTP client module
//!
//! The sync engine talks to the remote API only through [`ApiClient`]:
//! one authenticated GET returning a parsed JSON body. [`HttpClient`] is the
//! production implementation, with retry, backoff and rate limiting.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Ordered query parameters for a request
pub type QueryParams = Vec<(String, String)>;

/// Capability to fetch JSON from the remote API
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Perform an authenticated GET of `path` with `query`, returning the body
    async fn get_json(&self, path: &str, query: &QueryParams) -> Result<Value>;
}

#[async_trait]
impl<T: ApiClient + ?Sized> ApiClient for &T {
    async fn get_json(&self, path: &str, query: &QueryParams) -> Result<Value> {
        (**self).get_json(path, query).await
    }
}
