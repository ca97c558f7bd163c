//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the ghminer database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Harvested accounts, one row per remote id
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL UNIQUE,
    type TEXT,
    name TEXT,
    company TEXT,
    blog TEXT,
    location TEXT,
    email TEXT,
    hireable INTEGER,
    public_repos INTEGER,
    followers INTEGER,
    following INTEGER,
    created_at TEXT,
    updated_at TEXT
);

-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    start_cursor INTEGER NOT NULL,
    end_cursor INTEGER,
    accounts_saved INTEGER NOT NULL DEFAULT 0,
    accounts_skipped INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_status ON runs(status);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
