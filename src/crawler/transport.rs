//! HTTP transport for the GitHub API
//!
//! This module handles the raw request/response exchange, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Attaching the token and media type to every request
//! - Reading the rate-limit headers
//! - Separating connection failures from other request errors

use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::error::Error as StdError;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// GitHub's media type for REST v3 responses
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Unix timestamp (seconds) at which the current quota window resets
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Requests left in the current quota window
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Seconds to wait before retrying, sent with secondary rate limits
const RETRY_AFTER_HEADER: &str = "retry-after";

/// What the crawler needs to know about one API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed `X-RateLimit-Remaining` header
    pub rate_limit_remaining: Option<u64>,
    /// Parsed `X-RateLimit-Reset` header
    pub rate_limit_reset: Option<i64>,
    /// Parsed `Retry-After` header
    pub retry_after: Option<u64>,
    /// Response body text
    pub body: String,
}

impl ApiResponse {
    /// A response with the given status and body and no rate-limit headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            rate_limit_remaining: None,
            rate_limit_reset: None,
            retry_after: None,
            body: body.into(),
        }
    }
}

/// Failure to obtain any response at all
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection failed or broke before a full response arrived
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request failed for a reason retrying will not fix
    #[error("request failed: {0}")]
    Request(String),
}

/// A single authenticated GET against the API
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Transport` backed by a reqwest client
pub struct ReqwestTransport {
    client: Client,
    token: String,
}

impl ReqwestTransport {
    pub fn new(client: Client, token: String) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status().as_u16();
        let rate_limit_remaining = header_value(response.headers(), RATE_LIMIT_REMAINING_HEADER);
        let rate_limit_reset = header_value(response.headers(), RATE_LIMIT_RESET_HEADER);
        let retry_after = header_value(response.headers(), RETRY_AFTER_HEADER);
        let body = response.text().await.map_err(classify_error)?;

        Ok(ApiResponse {
            status,
            rate_limit_remaining,
            rate_limit_reset,
            retry_after,
            body,
        })
    }
}

/// Classifies a reqwest error as transient or not
///
/// Builder and redirect errors are fatal. Send failures count as
/// connectivity loss, and so do body reads cut short by the peer.
fn classify_error(e: reqwest::Error) -> TransportError {
    let transient = if e.is_builder() || e.is_redirect() {
        false
    } else {
        e.is_connect() || e.is_timeout() || e.is_request() || connection_dropped(&e)
    };

    if transient {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

/// Whether the error's source chain shows the connection going away
fn connection_dropped(e: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(e);
    while let Some(err) = source {
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        source = match err.downcast_ref::<io::Error>() {
            Some(io_err) if is_broken_connection(io_err.kind()) => return true,
            // Decoders wrap body errors in an io::Error that hides them from source()
            Some(io_err) => match io_err.get_ref() {
                Some(inner) => Some(inner as &(dyn StdError + 'static)),
                None => err.source(),
            },
            None => err.source(),
        };
    }
    false
}

fn is_broken_connection(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
