//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a harvest, including:
//! - Deriving the resume cursor from storage
//! - Requesting listing pages and fetching each listed account
//! - Skipping accounts that vanished between listing and fetch
//! - Advancing the cursor only past stored accounts
//! - Recording the run's outcome

use crate::config::Config;
use crate::crawler::client::RateLimitedClient;
use crate::crawler::clock::{Clock, SystemClock};
use crate::crawler::cursor::{list_usernames, listing_path, PageCursor};
use crate::crawler::fetcher::fetch_account;
use crate::crawler::transport::{ReqwestTransport, Transport};
use crate::state::CrawlPhase;
use crate::storage::{InsertOutcome, RunProgress, SqliteStorage, Storage};
use crate::{GhMinerError, Result};
use std::path::Path;

/// Summary of one finished crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    pub run_id: i64,
    pub start_cursor: i64,
    pub final_cursor: i64,
    pub pages_fetched: u64,
    pub accounts_saved: u64,
    pub accounts_skipped: u64,
}

impl CrawlReport {
    fn progress(&self) -> RunProgress {
        RunProgress {
            end_cursor: self.final_cursor,
            accounts_saved: self.accounts_saved,
            accounts_skipped: self.accounts_skipped,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<T = ReqwestTransport, C = SystemClock> {
    config: Config,
    config_hash: String,
    storage: SqliteStorage,
    client: RateLimitedClient<T, C>,
    phase: CrawlPhase,
}

impl Coordinator<ReqwestTransport, SystemClock> {
    /// Creates a coordinator talking to the configured API
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `token` - API token sent with every request
    /// * `config_hash` - Hash of the configuration file, stored with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(GhMinerError)` - Failed to open storage or build the client
    pub fn new(config: Config, token: String, config_hash: String) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let client = RateLimitedClient::from_config(&config.api, &config.retry, token)?;
        Ok(Self::with_parts(config, config_hash, storage, client))
    }
}

impl<T: Transport, C: Clock> Coordinator<T, C> {
    /// Assembles a coordinator from already-built parts
    pub fn with_parts(
        config: Config,
        config_hash: String,
        storage: SqliteStorage,
        client: RateLimitedClient<T, C>,
    ) -> Self {
        Self {
            config,
            config_hash,
            storage,
            client,
            phase: CrawlPhase::Bootstrapping,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs the crawl until the ceiling is reached or the listing runs dry
    ///
    /// On failure the run row is marked failed and the error is returned;
    /// everything stored before the failure stays stored, and the next run
    /// resumes after it.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.phase = CrawlPhase::Bootstrapping;

        let interrupted = self.storage.mark_interrupted_runs()?;
        if interrupted > 0 {
            tracing::info!("Marked {} unfinished run(s) as interrupted", interrupted);
        }

        let start = match self.storage.max_persisted_id()? {
            Some(id) => {
                tracing::info!("Resuming after account id #{}", id);
                id
            }
            None => {
                tracing::info!(
                    "No stored accounts, starting at floor #{}",
                    self.config.crawl.floor
                );
                self.config.crawl.floor
            }
        };

        let run_id = self.storage.create_run(&self.config_hash, start)?;
        tracing::info!("Starting crawl run {}", run_id);

        let mut cursor = PageCursor::new(start, self.config.crawl.ceiling);
        let mut report = CrawlReport {
            run_id,
            start_cursor: start,
            final_cursor: start,
            pages_fetched: 0,
            accounts_saved: 0,
            accounts_skipped: 0,
        };

        match self.crawl_pages(&mut cursor, &mut report).await {
            Ok(()) => {
                self.storage.complete_run(run_id, &report.progress())?;
                tracing::info!(
                    "Crawl run {} completed: {} saved, {} skipped, cursor at #{}",
                    run_id,
                    report.accounts_saved,
                    report.accounts_skipped,
                    report.final_cursor
                );
                Ok(report)
            }
            Err(e) => {
                self.phase = CrawlPhase::Failed;
                let recorded = self
                    .storage
                    .fail_run(run_id, &report.progress(), &e.to_string());
                if let Err(store_err) = recorded {
                    tracing::error!("Could not record failure of run {}: {}", run_id, store_err);
                }
                Err(e)
            }
        }
    }

    async fn crawl_pages(
        &mut self,
        cursor: &mut PageCursor,
        report: &mut CrawlReport,
    ) -> Result<()> {
        self.transition(CrawlPhase::FetchingPage)?;
        if cursor.is_exhausted() {
            tracing::info!(
                "Cursor #{} is already at the ceiling #{}",
                cursor.position(),
                cursor.ceiling()
            );
            return self.transition(CrawlPhase::Done);
        }

        loop {
            tracing::info!("Retrieving usernames after id #{}", cursor.position());
            let usernames =
                list_usernames(&self.client, cursor.position(), self.config.api.per_page).await?;
            report.pages_fetched += 1;

            if usernames.is_empty() {
                tracing::info!("No accounts listed after id #{}", cursor.position());
                return self.transition(CrawlPhase::Done);
            }

            let mut last_saved = None;
            for username in &usernames {
                self.transition(CrawlPhase::ProcessingRecord)?;
                if let Some(id) = self.process_username(username, report).await? {
                    last_saved = Some(id);
                }
            }

            self.transition(CrawlPhase::Advancing)?;
            let since = cursor.position();
            match last_saved {
                Some(id) if cursor.advance_to(id) => {
                    report.final_cursor = id;
                    tracing::debug!("Cursor advanced #{} -> #{}", since, id);
                }
                _ => {
                    let url = self
                        .client
                        .url_for(&listing_path(since, self.config.api.per_page));
                    return Err(GhMinerError::CursorStalled { since, url });
                }
            }

            if cursor.is_exhausted() {
                tracing::info!("Reached ceiling #{}", cursor.ceiling());
                return self.transition(CrawlPhase::Done);
            }
            self.transition(CrawlPhase::FetchingPage)?;
        }
    }

    /// Fetches and stores one listed account
    ///
    /// # Returns
    ///
    /// * `Ok(Some(id))` - The account was stored
    /// * `Ok(None)` - The account no longer exists and was skipped
    /// * `Err(GhMinerError)` - Anything else; ends the run
    async fn process_username(
        &mut self,
        username: &str,
        report: &mut CrawlReport,
    ) -> Result<Option<i64>> {
        let record = match fetch_account(&self.client, username).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Skipped nonexistent account: {}", e);
                report.accounts_skipped += 1;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match self.storage.insert_account(&record)? {
            InsertOutcome::Inserted => {
                report.accounts_saved += 1;
                tracing::info!("Metadata saved for account id #{}", record.id);
                Ok(Some(record.id))
            }
            InsertOutcome::AlreadyExists { existing_id } => {
                tracing::error!(
                    "Account #{} ({}) collides with stored account #{}",
                    record.id,
                    record.login,
                    existing_id
                );
                Err(GhMinerError::DuplicateAccount {
                    id: record.id,
                    login: record.login,
                })
            }
        }
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(GhMinerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}
