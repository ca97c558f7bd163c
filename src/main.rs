//! ghminer main entry point
//!
//! This is the command-line interface for the ghminer account harvester.

use anyhow::Context;
use clap::Parser;
use ghminer::config::{load_config_with_hash, load_token, validate, Config};
use ghminer::crawler::crawl;
use ghminer::output::{load_statistics, print_statistics};
use ghminer::storage::open_storage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// ghminer: incremental GitHub account harvester
///
/// Walks the GitHub `/users` listing and stores each account's public
/// metadata in SQLite. Every run resumes after the highest stored id.
#[derive(Parser, Debug)]
#[command(name = "ghminer")]
#[command(version)]
#[command(about = "Incremental GitHub account harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the starting id used when the database is empty
    #[arg(long, value_name = "ID")]
    floor: Option<i64>,

    /// Override the id at which the crawl stops
    #[arg(long, value_name = "ID")]
    ceiling: Option<i64>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(floor) = cli.floor {
        config.crawl.floor = floor;
    }
    if let Some(ceiling) = cli.ceiling {
        config.crawl.ceiling = ceiling;
    }
    validate(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ghminer=info,warn"),
            1 => EnvFilter::new("ghminer=debug,info"),
            2 => EnvFilter::new("ghminer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== ghminer Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Token file: {}", config.api.token_path);
    println!("  Page size: {}", config.api.per_page);
    println!("  User agent: {}", config.api.user_agent);

    println!("\nCrawl:");
    println!("  Floor: #{}", config.crawl.floor);
    println!("  Ceiling: #{}", config.crawl.ceiling);

    println!("\nRetry:");
    println!(
        "  Connection retry delay: {}ms",
        config.retry.connect_retry_delay_ms
    );
    println!(
        "  Rate-limit margin: {}s",
        config.retry.rate_limit_margin_secs
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let db_path = Path::new(&config.output.database_path);
    let start = if db_path.exists() {
        let storage = open_storage(db_path)?;
        load_statistics(&storage)?.resume_cursor
    } else {
        None
    };

    println!("\n✓ Configuration is valid");
    match start {
        Some(id) => println!("✓ Would resume after account id #{}", id),
        None => println!("✓ Would start at floor #{}", config.crawl.floor),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let token = load_token(Path::new(&config.api.token_path))?;

    tracing::info!(
        "Harvesting accounts up to id #{} into {}",
        config.crawl.ceiling,
        config.output.database_path
    );

    match crawl(config, token, config_hash).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully: {} pages, {} accounts saved, {} skipped",
                report.pages_fetched,
                report.accounts_saved,
                report.accounts_skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
