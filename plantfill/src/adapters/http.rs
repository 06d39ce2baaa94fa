//! Shared HTTP plumbing for remote source adapters
//!
//! Every remote adapter owns one [`HttpSource`]: a reqwest client with the
//! configured timeout, an optional courtesy throttle, and a bounded retry
//! loop with exponential backoff for transient failures. The throttle is only
//! consulted right before a network call, so cache hits never wait on it.

use crate::models::SourceId;
use crate::types::FetchError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use plantfill_common::EnrichConfig;
use reqwest::Client;
use std::time::Duration;

/// First backoff delay after a transient failure
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Backoff ceiling
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Longest error body kept in `FetchError::HttpStatus` messages
const MAX_ERROR_BODY: usize = 200;

/// Network settings shared by all remote adapters
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Minimum spacing between calls to one source (zero disables)
    pub rate_limit_delay: Duration,
    pub user_agent: String,
}

impl HttpSettings {
    pub fn from_config(config: &EnrichConfig) -> Self {
        Self {
            timeout: config.timeout_duration(),
            max_retries: config.max_retries,
            rate_limit_delay: config.rate_limit_duration(),
            user_agent: plantfill_common::config::user_agent(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::from_config(&EnrichConfig::default())
    }
}

/// Rate-limited, retrying HTTP access to one source
pub struct HttpSource {
    source: SourceId,
    client: Client,
    base_url: String,
    max_retries: u32,
    /// `None` when throttling is disabled
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl HttpSource {
    /// # Errors
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(source: SourceId, base_url: &str, settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout.min(Duration::from_secs(10)))
            .user_agent(settings.user_agent.clone())
            .build()?;

        let rate_limiter = Quota::with_period(settings.rate_limit_delay).map(RateLimiter::direct);

        Ok(Self {
            source,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `<base_url>/<path>` and return the body text
    ///
    /// Transient failures (transport errors, timeouts, 429 and 5xx) are
    /// retried up to `max_retries` extra times with exponential backoff.
    /// Query parameters are never logged since some carry credentials.
    pub async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempt = 0u32;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            attempt += 1;

            if let Some(limiter) = &self.rate_limiter {
                limiter.until_ready().await;
            }

            match self.send_once(&url, query).await {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::debug!(source = %self.source, path, attempt, "Request succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    tracing::warn!(
                        source = %self.source,
                        path,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient fetch failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(e) => {
                    if attempt > 1 {
                        tracing::warn!(source = %self.source, path, attempt, error = %e, "Giving up after retries");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| classify_transport_error(self.source, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport_error(self.source, e))
    }
}

fn classify_transport_error(source: SourceId, e: reqwest::Error) -> FetchError {
    // Strip the URL: it may contain an API key
    let e = e.without_url();
    if e.is_timeout() {
        FetchError::Timeout(format!("{} request timed out", source))
    } else {
        FetchError::Network(format!("{} request failed: {}", source, e))
    }
}
