//! Crawl statistics
//!
//! Counters mutated only by the crawl engine and read by the progress
//! reporter and the final summary.

use crate::crawler::FailureClass;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Running crawl statistics
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// Total URLs known to the crawl (visited + still queued)
    pub total_pages: u64,

    /// Pages fetched and written
    pub successful: u64,

    /// Pages that ended in a permanent failure of any class
    pub failed: u64,

    /// Pages skipped because a previous run already saved them
    pub skipped: u64,

    /// Failure counts by class
    pub failures_by_class: HashMap<FailureClass, u64>,

    /// Wall-clock start of the crawl
    pub started_at: DateTime<Utc>,

    start: Instant,
}

impl CrawlStats {
    /// Creates empty statistics starting now
    pub fn new() -> Self {
        Self {
            total_pages: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            failures_by_class: HashMap::new(),
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    pub fn record_failure(&mut self, class: FailureClass) {
        self.failed += 1;
        *self.failures_by_class.entry(class).or_insert(0) += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn set_discovered(&mut self, total: usize) {
        self.total_pages = total as u64;
    }

    /// Failures recorded for one class
    pub fn failures(&self, class: FailureClass) -> u64 {
        self.failures_by_class.get(&class).copied().unwrap_or(0)
    }

    /// Time since the crawl started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Successful pages per second over `elapsed`
    pub fn rate_over(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.successful as f64 / secs
        } else {
            0.0
        }
    }

    /// Progress line for the current moment
    pub fn report(&self) -> String {
        self.report_at(self.elapsed())
    }

    /// Progress line as of `elapsed`
    pub fn report_at(&self, elapsed: Duration) -> String {
        format!(
            "Progress: {}/{} pages ({} failed) [{:.2} pages/sec, {:.0}s elapsed]",
            self.successful,
            self.total_pages,
            self.failed,
            self.rate_over(elapsed),
            elapsed.as_secs_f64()
        )
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(stats: &CrawlStats, output_dir: &Path) {
    let elapsed = stats.elapsed().as_secs_f64();
    let rule = "=".repeat(80);

    println!();
    println!("{}", rule);
    println!("SCRAPING COMPLETE");
    println!("{}", rule);
    println!("  Total pages: {}", stats.total_pages);
    println!("  Successful: {}", stats.successful);
    println!("  Failed: {}", stats.failed);
    for class in FailureClass::all() {
        let count = stats.failures(class);
        if count > 0 {
            println!("    {}: {}", class, count);
        }
    }
    println!("  Skipped (already saved): {}", stats.skipped);
    println!("  Output: {}", output_dir.display());
    println!("  Started: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Time: {:.0}s ({:.1} minutes)", elapsed, elapsed / 60.0);
    println!("{}", rule);
}
