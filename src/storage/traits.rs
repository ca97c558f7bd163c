//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{AccountRecord, InsertOutcome, RunProgress, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawler only ever appends accounts; nothing here updates or deletes
/// an account row.
pub trait Storage {
    // ===== Account Management =====

    /// Highest stored account id, or `None` for an empty store
    ///
    /// This is the resume point of the crawl.
    fn max_persisted_id(&self) -> StorageResult<Option<i64>>;

    /// Lowest stored account id, or `None` for an empty store
    fn min_persisted_id(&self) -> StorageResult<Option<i64>>;

    /// Stores a record unless its id or login is already present
    ///
    /// The existence check and the insert run in one transaction that is
    /// committed before returning. An existing row is never overwritten.
    ///
    /// # Returns
    ///
    /// * `Ok(InsertOutcome::Inserted)` - The record is now durable
    /// * `Ok(InsertOutcome::AlreadyExists { .. })` - Nothing was written
    /// * `Err(StorageError)` - The database rejected the operation
    fn insert_account(&mut self, record: &AccountRecord) -> StorageResult<InsertOutcome>;

    /// Gets an account by id
    fn get_account(&self, id: i64) -> StorageResult<Option<AccountRecord>>;

    /// Gets total account count
    fn count_accounts(&self) -> StorageResult<u64>;

    /// Counts accounts grouped by their `type` column, largest group first
    fn count_accounts_by_type(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Run Management =====

    /// Creates a new crawl run starting at `start_cursor`
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, start_cursor: i64) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets up to `limit` runs, newest first
    fn list_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64, progress: &RunProgress) -> StorageResult<()>;

    /// Marks a run as failed and keeps the error that ended it
    fn fail_run(&mut self, run_id: i64, progress: &RunProgress, error: &str)
        -> StorageResult<()>;

    /// Flags every run still marked running as interrupted
    ///
    /// Called at startup: a run left in `running` belongs to a process that
    /// was killed.
    ///
    /// # Returns
    ///
    /// The number of runs that were flagged
    fn mark_interrupted_runs(&mut self) -> StorageResult<u64>;
}
