//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::GhMinerError;

/// Number of recent runs shown by `print_statistics`
const RECENT_RUNS: usize = 5;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored accounts
    pub total_accounts: u64,

    /// Lowest stored account id
    pub min_id: Option<i64>,

    /// Highest stored account id; the next run resumes after it
    pub resume_cursor: Option<i64>,

    /// Stored accounts grouped by type, largest group first
    pub accounts_by_type: Vec<(String, u64)>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(GhMinerError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, GhMinerError> {
    Ok(HarvestStatistics {
        total_accounts: storage.count_accounts()?,
        min_id: storage.min_persisted_id()?,
        resume_cursor: storage.max_persisted_id()?,
        accounts_by_type: storage.count_accounts_by_type()?,
        recent_runs: storage.list_runs(RECENT_RUNS)?,
    })
}

/// Share of the id range that resolved to a stored account
///
/// Ids are assigned sequentially upstream, so the gap between the range and
/// the row count approximates deleted accounts plus ids not yet reached.
pub fn coverage_percent(stats: &HarvestStatistics) -> Option<f64> {
    match (stats.min_id, stats.resume_cursor) {
        (Some(min), Some(max)) if max >= min => {
            let span = (max - min + 1) as f64;
            Some(stats.total_accounts as f64 / span * 100.0)
        }
        _ => None,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Stored accounts: {}", stats.total_accounts);
    match (stats.min_id, stats.resume_cursor) {
        (Some(min), Some(max)) => {
            println!("  Id range: #{} - #{}", min, max);
            println!("  Next run resumes after: #{}", max);
        }
        _ => println!("  Id range: (empty)"),
    }
    if let Some(coverage) = coverage_percent(stats) {
        println!("  Coverage of id range: {:.1}%", coverage);
    }
    println!();

    if !stats.accounts_by_type.is_empty() {
        println!("Accounts by Type:");
        for (account_type, count) in &stats.accounts_by_type {
            let percentage = if stats.total_accounts > 0 {
                (*count as f64 / stats.total_accounts as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", account_type, count, percentage);
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            let end = run
                .end_cursor
                .map(|c| format!("#{}", c))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  [{}] {} #{} -> {} saved={} skipped={}",
                run.id,
                run.started_at,
                run.start_cursor,
                end,
                run.accounts_saved,
                run.accounts_skipped
            );
            println!("      status: {}", run.status.to_db_string());
            if let Some(error) = &run.error_message {
                println!("      error: {}", error);
            }
        }
    }
}
