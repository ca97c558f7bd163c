//! Crawler module for harvesting account metadata
//!
//! This module contains the core crawling logic, including:
//! - The HTTP transport and the clock it backs off against
//! - Rate-limit aware request retry
//! - Listing pagination and cursor tracking
//! - Account detail fetching
//! - Overall crawl coordination

mod client;
mod clock;
mod coordinator;
mod cursor;
mod fetcher;
mod transport;

#[cfg(test)]
mod testing;

pub use client::{BackoffPolicy, RateLimitedClient};
pub use clock::{Clock, SystemClock};
pub use coordinator::{Coordinator, CrawlReport};
pub use cursor::{list_usernames, listing_path, PageCursor};
pub use fetcher::fetch_account;
pub use transport::{build_http_client, ApiResponse, ReqwestTransport, Transport, TransportError};

use crate::config::Config;
use crate::GhMinerError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Open the database and derive the resume cursor
/// 2. Build the HTTP client
/// 3. Page through the listing, storing every account that still exists
/// 4. Record the run's outcome
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `token` - API token
/// * `config_hash` - Hash of the configuration file
///
/// # Example
///
/// ```no_run
/// use ghminer::config::{load_config_with_hash, load_token};
/// use ghminer::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("ghminer.toml"))?;
/// let token = load_token(Path::new(&config.api.token_path))?;
/// let report = crawl(config, token, hash).await?;
/// println!("cursor now at #{}", report.final_cursor);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: Config,
    token: String,
    config_hash: String,
) -> Result<CrawlReport, GhMinerError> {
    let mut coordinator = Coordinator::new(config, token, config_hash)?;
    coordinator.run().await
}
