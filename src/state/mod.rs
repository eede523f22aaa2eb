//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of the crawl engine (idle, running, draining, done)

mod phase;

pub use phase::CrawlPhase;
