//! Crawler module for page rendering and mirroring
//!
//! This module contains the core crawling logic, including:
//! - Page rendering through headless Chrome or plain HTTP
//! - Retry with classified backoff
//! - HTML parsing and link extraction
//! - The FIFO frontier
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod fetcher;
mod frontier;
mod http;
mod parser;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::ChromiumRenderer;
pub use coordinator::{CrawlOutcome, Crawler, SkipReason, StepOutcome};
pub use fetcher::{
    fetch_with_retry, FailureClass, FetchFailure, PageRenderer, RenderError, RetryClass,
    RetryPolicy,
};
pub use frontier::Frontier;
pub use http::HttpRenderer;
pub use parser::extract_links;

use crate::config::{validate, Config, Engine};
use crate::storage::JsonManifest;
use crate::MirrorError;
use std::future::Future;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Create the output directory
/// 3. Start the configured rendering engine
/// 4. Crawl until the frontier empties or `shutdown` resolves
/// 5. Close the engine and save the resume manifest
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `shutdown` - Resolves when the crawl should stop early
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl ran and was torn down
/// * `Err(MirrorError)` - Invalid configuration or the engine failed to start
pub async fn run_crawl<F>(config: &Config, shutdown: F) -> Result<CrawlOutcome, MirrorError>
where
    F: Future<Output = ()>,
{
    validate(config)?;

    let output_dir = &config.output.directory;
    std::fs::create_dir_all(output_dir)?;
    let store = JsonManifest::new(output_dir);

    match config.browser.engine {
        Engine::Chromium => {
            let renderer = ChromiumRenderer::launch(&config.browser).await?;
            crawl_with(config, renderer, store, shutdown).await
        }
        Engine::Http => {
            let renderer = HttpRenderer::new(&config.browser)?;
            crawl_with(config, renderer, store, shutdown).await
        }
    }
}

async fn crawl_with<R, F>(
    config: &Config,
    renderer: R,
    store: JsonManifest,
    shutdown: F,
) -> Result<CrawlOutcome, MirrorError>
where
    R: PageRenderer,
    F: Future<Output = ()>,
{
    let mut crawler = Crawler::new(config, renderer, store)?;
    Ok(crawler.run_until(shutdown).await)
}
