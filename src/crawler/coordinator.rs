//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Loading the resume manifest and seeding the frontier
//! - Skipping visited URLs and pages already on disk
//! - Fetching, writing and link extraction for each page
//! - Rate limiting between network iterations
//! - Teardown on completion, interrupt or crash

use crate::config::{validate, Config};
use crate::crawler::fetcher::{fetch_with_retry, FailureClass, PageRenderer, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::output::{page_file_path, write_page, CrawlStats};
use crate::state::CrawlPhase;
use crate::storage::{load_or_empty, save_or_warn, ResumeStore};
use crate::url::{normalize, NormalizedUrl, Scope};
use crate::MirrorError;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Why a popped URL was not fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already processed in this run or a previous one
    AlreadyVisited,
    /// Resume is on and the page file already exists
    AlreadySaved,
}

/// Result of processing one frontier entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Saved {
        url: NormalizedUrl,
        path: PathBuf,
        links_queued: usize,
    },
    Skipped {
        url: NormalizedUrl,
        reason: SkipReason,
    },
    Failed {
        url: NormalizedUrl,
        class: FailureClass,
    },
    /// The frontier was empty
    Exhausted,
}

impl StepOutcome {
    /// True when the step made a request, so the rate-limit delay applies
    pub fn touched_network(&self) -> bool {
        matches!(self, Self::Saved { .. } | Self::Failed { .. })
    }
}

/// What a finished `run` / `run_until` reports
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub stats: CrawlStats,

    /// The shutdown signal fired before the frontier emptied
    pub cancelled: bool,

    /// Panic message if the loop crashed
    pub aborted: Option<String>,

    /// The resume manifest was written during teardown
    pub state_saved: bool,
}

/// The crawl engine
///
/// Owns the frontier, the visited set and the statistics. The renderer and
/// the resume store are injected so the engine can be driven without a
/// browser.
pub struct Crawler<R, S> {
    scope: Scope,
    output_dir: PathBuf,
    resume: bool,
    rate_limit_delay: Duration,
    retry_policy: RetryPolicy,
    renderer: R,
    store: S,
    frontier: Frontier,
    visited: HashSet<NormalizedUrl>,
    stats: CrawlStats,
    phase: CrawlPhase,
    in_flight: Option<NormalizedUrl>,
}

impl<R: PageRenderer, S: ResumeStore> Crawler<R, S> {
    /// Creates a crawler seeded with the configured start URL
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration; validated here
    /// * `renderer` - Performs each page render
    /// * `store` - Holds the visited set between runs
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Engine in `Idle` with the seed queued
    /// * `Err(MirrorError)` - Invalid configuration or out-of-scope seed
    pub fn new(config: &Config, renderer: R, store: S) -> Result<Self, MirrorError> {
        validate(config)?;
        let seed = Url::parse(&config.scope.start_url)?;

        let visited = if config.crawler.resume {
            let visited = load_or_empty(&store);
            if !visited.is_empty() {
                tracing::info!("Resuming: {} URLs already visited", visited.len());
            }
            visited
        } else {
            HashSet::new()
        };

        let mut crawler = Self {
            scope: config.scope(),
            output_dir: config.output.directory.clone(),
            resume: config.crawler.resume,
            rate_limit_delay: config.crawler.rate_limit_delay(),
            retry_policy: RetryPolicy::from_config(&config.crawler),
            renderer,
            store,
            frontier: Frontier::with_seed(seed),
            visited,
            stats: CrawlStats::new(),
            phase: CrawlPhase::Idle,
            in_flight: None,
        };
        crawler.update_discovered();

        Ok(crawler)
    }

    /// Replaces the retry policy derived from the config
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn visited(&self) -> &HashSet<NormalizedUrl> {
        &self.visited
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Processes the next frontier entry
    ///
    /// Never sleeps for the rate-limit delay; `run` applies it between steps.
    pub async fn step(&mut self) -> StepOutcome {
        if self.phase == CrawlPhase::Idle {
            self.transition(CrawlPhase::Running);
        }

        let Some(url) = self.frontier.pop() else {
            return StepOutcome::Exhausted;
        };
        let normalized = normalize(&url);

        if self.visited.contains(&normalized) {
            tracing::debug!("Already visited: {}", normalized);
            return StepOutcome::Skipped {
                url: normalized,
                reason: SkipReason::AlreadyVisited,
            };
        }

        let path = page_file_path(&normalized, self.scope.path_prefix(), &self.output_dir);

        if self.resume && path.exists() {
            tracing::info!("[SKIP] {} (already exists)", normalized);
            self.visited.insert(normalized.clone());
            self.stats.record_skip();
            self.update_discovered();
            return StepOutcome::Skipped {
                url: normalized,
                reason: SkipReason::AlreadySaved,
            };
        }

        tracing::info!("Fetching: {}", url);
        self.in_flight = Some(normalized.clone());

        let content = match fetch_with_retry(&mut self.renderer, &url, &self.retry_policy).await {
            Ok(content) => content,
            Err(failure) => {
                tracing::warn!("[FAIL] {}: {}", normalized, failure);
                return self.finish_failed(normalized, failure.class);
            }
        };

        if let Err(e) = write_page(&path, &content).await {
            tracing::warn!("[FAIL] {}: cannot write {}: {}", normalized, path.display(), e);
            return self.finish_failed(normalized, FailureClass::FilesystemWrite);
        }

        let links = extract_links(&content, &url, &self.scope);
        let found = links.len();
        let mut links_queued = 0;
        for link in links {
            if !self.visited.contains(&link) {
                self.frontier.push(link.into());
                links_queued += 1;
            }
        }
        tracing::debug!("{} in-scope links on {}, {} queued", found, normalized, links_queued);

        self.visited.insert(normalized.clone());
        self.in_flight = None;
        self.stats.record_success();
        self.update_discovered();

        tracing::info!("[OK] {} -> {}", normalized, path.display());
        tracing::info!("  {}", self.stats.report());

        StepOutcome::Saved {
            url: normalized,
            path,
            links_queued,
        }
    }

    /// Runs until the frontier is empty
    pub async fn run(&mut self) -> CrawlOutcome {
        self.run_until(std::future::pending()).await
    }

    /// Runs until the frontier is empty or `shutdown` resolves
    ///
    /// Teardown always happens: the renderer is closed, the visited set is
    /// saved and the phase becomes `Done`. A URL whose render was interrupted
    /// by `shutdown` stays unvisited so the next run fetches it.
    pub async fn run_until<F>(&mut self, shutdown: F) -> CrawlOutcome
    where
        F: Future<Output = ()>,
    {
        if self.phase.is_terminal() {
            return self.outcome(false, None, false);
        }

        tokio::pin!(shutdown);
        tracing::info!(
            "Starting crawl of {} ({} visited, {} queued)",
            self.scope,
            self.visited.len(),
            self.frontier.len()
        );

        let mut cancelled = false;
        let mut aborted = None;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Interrupted, shutting down");
                    cancelled = true;
                    break;
                }

                result = AssertUnwindSafe(self.iterate()).catch_unwind() => match result {
                    Ok(StepOutcome::Exhausted) => break,
                    Ok(_) => {}
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::error!("Crawl loop crashed: {}", message);
                        aborted = Some(message);
                        break;
                    }
                },
            }
        }

        self.teardown(cancelled, aborted).await
    }

    async fn iterate(&mut self) -> StepOutcome {
        let outcome = self.step().await;
        if outcome.touched_network() && !self.rate_limit_delay.is_zero() {
            tokio::time::sleep(self.rate_limit_delay).await;
        }
        outcome
    }

    async fn teardown(&mut self, cancelled: bool, aborted: Option<String>) -> CrawlOutcome {
        if let Some(url) = self.in_flight.take() {
            if aborted.is_some() {
                tracing::warn!("[FAIL] {}: crawl loop crashed while processing", url);
                self.visited.insert(url);
                self.stats.record_failure(FailureClass::Permanent);
            } else {
                tracing::debug!("Leaving interrupted URL unvisited: {}", url);
            }
        }

        if self.phase == CrawlPhase::Running && !cancelled && aborted.is_none() {
            self.transition(CrawlPhase::Draining);
        }

        if let Err(e) = self.renderer.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        let state_saved = save_or_warn(&self.store, &self.visited);
        self.update_discovered();
        self.transition(CrawlPhase::Done);

        self.outcome(cancelled, aborted, state_saved)
    }

    fn outcome(&self, cancelled: bool, aborted: Option<String>, state_saved: bool) -> CrawlOutcome {
        CrawlOutcome {
            stats: self.stats.clone(),
            cancelled,
            aborted,
            state_saved,
        }
    }

    fn finish_failed(&mut self, url: NormalizedUrl, class: FailureClass) -> StepOutcome {
        self.visited.insert(url.clone());
        self.in_flight = None;
        self.stats.record_failure(class);
        self.update_discovered();
        tracing::info!("  {}", self.stats.report());
        StepOutcome::Failed { url, class }
    }

    fn update_discovered(&mut self) {
        self.stats
            .set_discovered(self.visited.len() + self.frontier.len());
    }

    fn transition(&mut self, next: CrawlPhase) {
        if let Err(e) = self.try_transition(next) {
            tracing::warn!("{}", e);
        }
    }

    fn try_transition(&mut self, next: CrawlPhase) -> Result<(), MirrorError> {
        if !self.phase.can_transition_to(next) {
            return Err(MirrorError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
