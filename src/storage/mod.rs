//! Storage module for persisting harvested accounts
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Write-once persistence of account records
//! - Deriving the resume cursor from stored data
//! - Run tracking for interrupted and failed harvests

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::GhMinerError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(GhMinerError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, GhMinerError> {
    SqliteStorage::new(path)
}

/// The fixed set of account fields kept from an API response
///
/// Deserializes straight from the `/users/{login}` payload; anything the
/// response omits becomes `None`, and every field not listed here is
/// dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountRecord {
    pub id: i64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub hireable: Option<bool>,
    #[serde(default)]
    pub public_repos: Option<i64>,
    #[serde(default)]
    pub followers: Option<i64>,
    #[serde(default)]
    pub following: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// A record carrying only the two mandatory fields
    pub fn new(id: i64, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            account_type: None,
            name: None,
            company: None,
            blog: None,
            location: None,
            email: None,
            hireable: None,
            public_repos: None,
            followers: None,
            following: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Result of offering a record to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written and committed
    Inserted,

    /// A row with the same id or login already exists and was left untouched
    AlreadyExists { existing_id: i64 },
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub start_cursor: i64,
    pub end_cursor: Option<i64>,
    pub accounts_saved: u64,
    pub accounts_skipped: u64,
    pub error_message: Option<String>,
}

/// Counters written to a run row when it finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub end_cursor: i64,
    pub accounts_saved: u64,
    pub accounts_skipped: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
