//! HTTP client with retry and rate limiting
//!
//! Every call goes through the same path: wait for a rate-limit token,
//! send one authenticated GET, then turn any failure into an `Error` and let
//! `Error::is_retryable` decide whether to try again.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::{ApiClient, QueryParams};
use crate::auth::{AuthConfig, Authenticator};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::types::BackoffType;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_type: BackoffType,
    /// `None` disables pacing
    pub rate_limit: Option<RateLimiterConfig>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_ENDPOINT_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Defaults pointed at the configured endpoint
    pub fn for_source(config: &SourceConfig) -> Self {
        Self::builder().base_url(&config.endpoint_url).build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff strategy and its bounds
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Authenticated Agora REST client
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client with authentication
    pub fn new(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            authenticator: Authenticator::new(auth_config),
            config,
        })
    }

    /// Client for a validated source config, with default retry and pacing
    pub fn for_source(config: &SourceConfig) -> Result<Self> {
        Self::new(HttpClientConfig::for_source(config), AuthConfig::agora(config))
    }

    /// Perform a GET with retries, returning the successful response
    pub async fn get(&self, path: &str, query: &QueryParams) -> Result<Response> {
        let url = self.build_url(path);
        let attempts = self.config.max_retries + 1;

        for attempt in 0..attempts {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            match self.attempt(&url, query).await {
                Ok(response) => {
                    debug!(path, attempt, "GET succeeded");
                    return Ok(response);
                }
                Err(error) if !error.is_retryable() || attempt + 1 == attempts => {
                    return Err(error)
                }
                Err(error) => {
                    let after = self.retry_delay(&error, attempt);
                    warn!(
                        "GET {path} failed ({error}), attempt {}/{attempts}, retrying in {after:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(after).await;
                }
            }
        }

        Err(Error::MaxRetriesExceeded {
            max_retries: self.config.max_retries,
        })
    }

    /// Send one request; any non-success status becomes an error
    async fn attempt(&self, url: &str, query: &QueryParams) -> Result<Response> {
        let mut request = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = self
            .authenticator
            .apply(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    }
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                retry_after_seconds: retry_after(&response),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::http_status(status.as_u16(), body))
    }

    /// Throttling waits as long as the server asked; everything else backs off
    fn retry_delay(&self, error: &Error, attempt: u32) -> Duration {
        match error {
            Error::RateLimited {
                retry_after_seconds,
            } => Duration::from_secs(*retry_after_seconds),
            _ => self.calculate_backoff(attempt),
        }
    }

    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Delay before retry number `attempt + 1`, capped at `max_backoff`
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff;
        let delay = match self.config.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt + 1),
            BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.config.max_backoff)
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn get_json(&self, path: &str, query: &QueryParams) -> Result<Value> {
        let body = self.get(path, query).await?.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("Response from {path} is not valid JSON: {e}")))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.authenticator.is_configured())
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Seconds from the `Retry-After` header, 60 when absent or unparsable
fn retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(60)
}
