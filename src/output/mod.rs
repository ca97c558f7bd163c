//! Output module for reporting on harvested data

pub mod stats;

pub use stats::{coverage_percent, load_statistics, print_statistics, HarvestStatistics};
