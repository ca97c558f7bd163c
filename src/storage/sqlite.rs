//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{AccountRecord, InsertOutcome, RunProgress, RunRecord, RunStatus};
use crate::GhMinerError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ACCOUNT_COLUMNS: &str = "id, login, type, name, company, blog, location, email, hireable,
     public_repos, followers, following, created_at, updated_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, start_cursor,
     end_cursor, accounts_saved, accounts_skipped, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(GhMinerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, GhMinerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, GhMinerError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        progress: &RunProgress,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, end_cursor = ?3,
             accounts_saved = ?4, accounts_skipped = ?5, error_message = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                progress.end_cursor,
                progress.accounts_saved as i64,
                progress.accounts_skipped as i64,
                error,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

/// Reads an RFC 3339 text column back into a timestamp
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        id: row.get(0)?,
        login: row.get(1)?,
        account_type: row.get(2)?,
        name: row.get(3)?,
        company: row.get(4)?,
        blog: row.get(5)?,
        location: row.get(6)?,
        email: row.get(7)?,
        hireable: row.get(8)?,
        public_repos: row.get(9)?,
        followers: row.get(10)?,
        following: row.get(11)?,
        created_at: timestamp_column(row, 12)?,
        updated_at: timestamp_column(row, 13)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Interrupted),
        start_cursor: row.get(5)?,
        end_cursor: row.get(6)?,
        accounts_saved: row.get::<_, i64>(7)? as u64,
        accounts_skipped: row.get::<_, i64>(8)? as u64,
        error_message: row.get(9)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Account Management =====

    fn max_persisted_id(&self) -> StorageResult<Option<i64>> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM accounts", [], |row| row.get(0))?;
        Ok(max)
    }

    fn min_persisted_id(&self) -> StorageResult<Option<i64>> {
        let min: Option<i64> = self
            .conn
            .query_row("SELECT MIN(id) FROM accounts", [], |row| row.get(0))?;
        Ok(min)
    }

    fn insert_account(&mut self, record: &AccountRecord) -> StorageResult<InsertOutcome> {
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM accounts WHERE id = ?1 OR login = ?2 LIMIT 1",
                params![record.id, record.login],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing_id) = existing {
            // Dropping the transaction rolls it back; nothing was written
            return Ok(InsertOutcome::AlreadyExists { existing_id });
        }

        tx.execute(
            &format!(
                "INSERT INTO accounts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                ACCOUNT_COLUMNS
            ),
            params![
                record.id,
                record.login,
                record.account_type,
                record.name,
                record.company,
                record.blog,
                record.location,
                record.email,
                record.hireable,
                record.public_repos,
                record.followers,
                record.following,
                record.created_at.map(|dt| dt.to_rfc3339()),
                record.updated_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        tx.commit()?;

        Ok(InsertOutcome::Inserted)
    }

    fn get_account(&self, id: i64) -> StorageResult<Option<AccountRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE id = ?1",
            ACCOUNT_COLUMNS
        ))?;

        let account = stmt.query_row(params![id], account_from_row).optional()?;
        Ok(account)
    }

    fn count_accounts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_accounts_by_type(&self) -> StorageResult<Vec<(String, u64)>> {
        let query = "
            SELECT COALESCE(type, 'Unknown') AS account_type, COUNT(*) AS count
            FROM accounts
            GROUP BY account_type
            ORDER BY count DESC, account_type ASC
        ";

        let mut stmt = self.conn.prepare(query)?;
        let breakdown = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(breakdown)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, start_cursor: i64) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, start_cursor) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, RunStatus::Running.to_db_string(), start_cursor],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        let run = stmt.query_row(params![run_id], run_from_row).optional()?;
        run.ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        let run = stmt.query_row([], run_from_row).optional()?;
        Ok(run)
    }

    fn list_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    fn complete_run(&mut self, run_id: i64, progress: &RunProgress) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed, progress, None)
    }

    fn fail_run(
        &mut self,
        run_id: i64,
        progress: &RunProgress,
        error: &str,
    ) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed, progress, Some(error))
    }

    fn mark_interrupted_runs(&mut self) -> StorageResult<u64> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE status = ?2",
            params![
                RunStatus::Interrupted.to_db_string(),
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(updated as u64)
    }
}
