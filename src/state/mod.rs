//! State module for tracking crawl progress
//!
//! `CrawlPhase` names where the crawl loop currently is and which moves out
//! of that phase are legal.

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
