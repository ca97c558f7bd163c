//! Configuration module for ghminer
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading the API token they point at.
//!
//! # Example
//!
//! ```no_run
//! use ghminer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ghminer.toml")).unwrap();
//! println!("Harvesting up to account #{}", config.crawl.ceiling);
//! ```

mod credential;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CrawlConfig, OutputConfig, RetryConfig};

pub use credential::load_token;
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
