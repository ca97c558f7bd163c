//! ghminer: an incremental GitHub account harvester
//!
//! This crate walks the paginated `/users` listing of the GitHub API, fetches
//! the metadata of every listed account, and persists it to SQLite. Progress
//! is derived from the stored data, so an interrupted harvest resumes where
//! it stopped instead of re-scanning from the beginning.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for ghminer operations
#[derive(Debug, Error)]
pub enum GhMinerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The API answered with a status the crawler cannot recover from
    #[error("Remote request failed: {url} ({status_code})")]
    RemoteRequest { url: String, status_code: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    /// An account that is already stored was offered for insertion again
    #[error("Account #{id} ({login}) is already stored; cursor bookkeeping is inconsistent")]
    DuplicateAccount { id: i64, login: String },

    /// A page was processed without persisting anything beyond the cursor
    #[error("Cursor stalled at id #{since}: {url} produced no account beyond it")]
    CursorStalled { since: i64, url: String },

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl GhMinerError {
    /// Returns true if this is a 404 answer from the API
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RemoteRequest {
                status_code: 404,
                ..
            }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to load API token from {path}: {source}")]
    Credential {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for ghminer operations
pub type Result<T> = std::result::Result<T, GhMinerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Coordinator};
pub use state::CrawlPhase;
pub use storage::{AccountRecord, InsertOutcome};
