//! Rate-limit aware API client
//!
//! Wraps a `Transport` and turns raw responses into JSON values or errors.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 200 | Decode body as JSON |
//! | Connection failure / timeout | Sleep `connect_retry_delay`, retry |
//! | HTTP 403/429 with `X-RateLimit-Reset` | Sleep until reset + margin, retry |
//! | HTTP 403/429 with `Retry-After` | Sleep retry-after + margin, retry |
//! | Any other status | `RemoteRequest { url, status_code }` |
//! | Other transport error | `Transport { url, message }` |
//!
//! Retries are unbounded; the API recovering is the only exit besides a
//! fatal status.

use crate::config::{ApiConfig, RetryConfig};
use crate::crawler::clock::{Clock, SystemClock};
use crate::crawler::transport::{
    build_http_client, ApiResponse, ReqwestTransport, Transport, TransportError,
};
use crate::{GhMinerError, Result};
use serde_json::Value;
use std::time::Duration;

/// Delays applied between retries of the same request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub connect_retry_delay: Duration,
    pub rate_limit_margin: Duration,
    pub min_rate_limit_wait: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            connect_retry_delay: config.connect_retry_delay(),
            rate_limit_margin: config.rate_limit_margin(),
            min_rate_limit_wait: config.min_rate_limit_wait(),
        }
    }

    /// Sleep needed before the quota resets at `reset_at` (unix seconds)
    ///
    /// `max(min_wait, reset_at - now + margin)`; a reset time in the past
    /// never produces a negative duration.
    pub fn rate_limit_wait(&self, reset_at: i64, now: i64) -> Duration {
        let margin = self.rate_limit_margin.as_secs() as i64;
        let raw = reset_at.saturating_sub(now).saturating_add(margin);
        Duration::from_secs(raw.max(0) as u64).max(self.min_rate_limit_wait)
    }

    /// Sleep for a `Retry-After` answer
    pub fn retry_after_wait(&self, retry_after_secs: u64) -> Duration {
        Duration::from_secs(retry_after_secs)
            .saturating_add(self.rate_limit_margin)
            .max(self.min_rate_limit_wait)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Issues GET requests against the API, absorbing transient failures
pub struct RateLimitedClient<T = ReqwestTransport, C = SystemClock> {
    transport: T,
    clock: C,
    policy: BackoffPolicy,
    base_url: String,
}

impl RateLimitedClient<ReqwestTransport, SystemClock> {
    /// Builds the production client from configuration and the API token
    pub fn from_config(api: &ApiConfig, retry: &RetryConfig, token: String) -> Result<Self> {
        let http = build_http_client(api)?;
        Ok(Self::new(
            ReqwestTransport::new(http, token),
            SystemClock,
            BackoffPolicy::from_config(retry),
            api.base_url.clone(),
        ))
    }
}

impl<T: Transport, C: Clock> RateLimitedClient<T, C> {
    pub fn new(transport: T, clock: C, policy: BackoffPolicy, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            clock,
            policy,
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for an API path such as `/users/octocat`
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Fetches `path` and returns the decoded JSON body
    ///
    /// Blocks through connection failures and exhausted quotas; every
    /// retry re-sends the identical request.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The 200 response body
    /// * `Err(GhMinerError::RemoteRequest)` - Any non-retryable status
    /// * `Err(GhMinerError::Decode)` - A 200 whose body is not JSON
    /// * `Err(GhMinerError::Transport)` - A non-connection request failure
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url_for(path);

        loop {
            let response = match self.transport.get(&url).await {
                Ok(response) => response,
                Err(TransportError::Connect(message)) => {
                    let delay = self.policy.connect_retry_delay;
                    tracing::warn!(
                        "Connection error for {} ({}), retrying in {:?}",
                        url,
                        message,
                        delay
                    );
                    self.clock.sleep(delay).await;
                    continue;
                }
                Err(TransportError::Request(message)) => {
                    return Err(GhMinerError::Transport { url, message });
                }
            };

            if response.status == 200 {
                return serde_json::from_str(&response.body)
                    .map_err(|source| GhMinerError::Decode { url, source });
            }

            if let Some(wait) = self.quota_wait(&response) {
                tracing::warn!(
                    "Rate limit exceeded (HTTP {}), sleeping for {} seconds",
                    response.status,
                    wait.as_secs()
                );
                self.clock.sleep(wait).await;
                continue;
            }

            return Err(GhMinerError::RemoteRequest {
                url,
                status_code: response.status,
            });
        }
    }

    /// How long to back off if `response` means "quota exhausted"
    ///
    /// GitHub sends `X-RateLimit-Reset` on every response, so a reset header
    /// only counts when the remaining quota is zero or was not reported.
    fn quota_wait(&self, response: &ApiResponse) -> Option<Duration> {
        if response.status != 403 && response.status != 429 {
            return None;
        }

        if let Some(secs) = response.retry_after {
            return Some(self.policy.retry_after_wait(secs));
        }

        let exhausted = response.rate_limit_remaining.map_or(true, |left| left == 0);
        match response.rate_limit_reset {
            Some(reset_at) if exhausted => {
                let now = self.clock.now().timestamp();
                Some(self.policy.rate_limit_wait(reset_at, now))
            }
            _ => None,
        }
    }
}
