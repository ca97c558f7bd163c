use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for ghminer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// Remote API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root of the API, without a trailing slash
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// File holding the personal access token
    #[serde(rename = "token-path")]
    pub token_path: String,

    /// Usernames requested per listing page
    #[serde(rename = "per-page", default = "default_per_page")]
    pub per_page: u32,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Bounds of the harvested id range
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Cursor used when the database holds no accounts yet
    #[serde(default)]
    pub floor: i64,

    /// The crawl stops once the cursor reaches this id
    #[serde(default = "default_ceiling")]
    pub ceiling: i64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            floor: 0,
            ceiling: default_ceiling(),
        }
    }
}

/// Backoff behavior for transient failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Pause before retrying after a connection failure (milliseconds)
    #[serde(rename = "connect-retry-delay-ms", default = "default_connect_retry_delay")]
    pub connect_retry_delay_ms: u64,

    /// Added on top of the advertised rate-limit reset to absorb clock skew
    #[serde(rename = "rate-limit-margin-secs", default = "default_rate_limit_margin")]
    pub rate_limit_margin_secs: u64,

    /// Lower bound for a rate-limit sleep
    #[serde(rename = "min-rate-limit-wait-secs", default)]
    pub min_rate_limit_wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            connect_retry_delay_ms: default_connect_retry_delay(),
            rate_limit_margin_secs: default_rate_limit_margin(),
            min_rate_limit_wait_secs: 0,
        }
    }
}

impl RetryConfig {
    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }

    pub fn rate_limit_margin(&self) -> Duration {
        Duration::from_secs(self.rate_limit_margin_secs)
    }

    pub fn min_rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.min_rate_limit_wait_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_user_agent() -> String {
    format!("ghminer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_ceiling() -> i64 {
    25_000_000
}

fn default_connect_retry_delay() -> u64 {
    3_000
}

fn default_rate_limit_margin() -> u64 {
    3
}
