//! Page fetching with retry and backoff
//!
//! This module defines the rendering seam used by the crawl engine and the
//! retry policy wrapped around it:
//! - `PageRenderer`: one render attempt for one URL
//! - `RenderError`: attempt failures, already classified by the renderer
//! - `RetryPolicy` / `fetch_with_retry`: backoff driven by that classification

use crate::config::CrawlerConfig;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failure of a single render attempt
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The origin signalled HTTP 429 or an equivalent rate-limit condition
    #[error("rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    /// Navigation or network settling did not finish in time
    #[error("timed out: {0}")]
    Timeout(String),

    /// Any other failure; never retried
    #[error("{0}")]
    Failed(String),
}

/// How the retry loop treats a `RenderError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Retried with long backoff; does not count toward the attempt cap
    RateLimit,
    /// Retried with short backoff up to the attempt cap
    Timeout,
    /// Reported immediately as a permanent failure
    Never,
}

impl RenderError {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::RateLimit,
            Self::Timeout(_) => RetryClass::Timeout,
            Self::Failed(_) => RetryClass::Never,
        }
    }
}

/// Why a URL ended up permanently failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Rate-limit retries hit the configured cap
    RateLimitExhausted,
    /// Every allowed attempt timed out
    TimeoutExhausted,
    /// Non-retryable fetch error
    Permanent,
    /// Page fetched but the file could not be written
    FilesystemWrite,
}

impl FailureClass {
    pub fn all() -> [FailureClass; 4] {
        [
            Self::RateLimitExhausted,
            Self::TimeoutExhausted,
            Self::Permanent,
            Self::FilesystemWrite,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimitExhausted => "rate limit exhausted",
            Self::TimeoutExhausted => "timed out",
            Self::Permanent => "permanent fetch failure",
            Self::FilesystemWrite => "filesystem write failure",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of `fetch_with_retry` for a URL that could not be fetched
#[derive(Debug, Clone, Error)]
#[error("{class} after {attempts} attempt(s): {error}")]
pub struct FetchFailure {
    pub class: FailureClass,
    pub attempts: u32,
    pub error: RenderError,
}

/// Renders one page per call
///
/// Implementations perform exactly one attempt and classify its failure;
/// retrying is the caller's job. `close` releases whatever automation session
/// the renderer holds and must be safe to call more than once.
#[async_trait]
pub trait PageRenderer: Send {
    /// Renders `url` and returns the full document text
    async fn render(&mut self, url: &Url) -> Result<String, RenderError>;

    /// Releases the rendering session
    async fn close(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Retry and backoff policy for one URL
///
/// | Condition    | Action                                               |
/// |--------------|------------------------------------------------------|
/// | Rate limited | Retry after `rate_limit_base * 2^n`, unbounded by default |
/// | Timeout      | Retry after `timeout_base * 2^n`, `max_retries` attempts total |
/// | Other        | Immediate permanent failure                          |
///
/// `n` counts earlier failures of the same class for this URL, from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total timed-out attempts allowed before giving up
    pub max_retries: u32,

    /// Rate-limit retries allowed before giving up; `None` retries forever
    pub max_rate_limit_retries: Option<u32>,

    pub rate_limit_base: Duration,

    pub timeout_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            max_rate_limit_retries: config.max_rate_limit_retries,
            ..Self::default()
        }
    }

    /// Delay before retrying after the `n`th rate limit (0-based)
    pub fn rate_limit_backoff(&self, n: u32) -> Duration {
        exponential(self.rate_limit_base, n)
    }

    /// Delay before retrying after the `n`th timeout (0-based)
    pub fn timeout_backoff(&self, n: u32) -> Duration {
        exponential(self.timeout_base, n)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_rate_limit_retries: None,
            rate_limit_base: Duration::from_secs(10),
            timeout_base: Duration::from_secs(1),
        }
    }
}

fn exponential(base: Duration, n: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(n))
}

/// Fetches a URL, retrying transient failures according to `policy`
///
/// # Arguments
///
/// * `renderer` - The renderer performing each attempt
/// * `url` - The URL to fetch
/// * `policy` - Attempt caps and backoff bases
///
/// # Returns
///
/// * `Ok(String)` - The rendered document
/// * `Err(FetchFailure)` - The URL is permanently failed for this run
pub async fn fetch_with_retry<R>(
    renderer: &mut R,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<String, FetchFailure>
where
    R: PageRenderer + ?Sized,
{
    let mut attempts = 0u32;
    let mut timeouts = 0u32;
    let mut rate_limits = 0u32;

    loop {
        attempts += 1;

        let error = match renderer.render(url).await {
            Ok(content) => return Ok(content),
            Err(e) => e,
        };

        match error.retry_class() {
            RetryClass::RateLimit => {
                if let Some(cap) = policy.max_rate_limit_retries {
                    if rate_limits >= cap {
                        tracing::warn!("  Rate limited {} times on {}, giving up", rate_limits + 1, url);
                        return Err(FetchFailure {
                            class: FailureClass::RateLimitExhausted,
                            attempts,
                            error,
                        });
                    }
                }

                let delay = policy.rate_limit_backoff(rate_limits);
                rate_limits += 1;
                tracing::warn!("  Rate limited on {}, waiting {}s...", url, delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }

            RetryClass::Timeout => {
                timeouts += 1;
                if timeouts >= policy.max_retries {
                    tracing::warn!("  Timeout after {} attempts on {}", timeouts, url);
                    return Err(FetchFailure {
                        class: FailureClass::TimeoutExhausted,
                        attempts,
                        error,
                    });
                }

                let delay = policy.timeout_backoff(timeouts - 1);
                tracing::warn!(
                    "  Timeout on {}, retry {}/{} in {}s...",
                    url,
                    timeouts,
                    policy.max_retries,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            RetryClass::Never => {
                tracing::warn!("  Error on {}: {}", url, error);
                return Err(FetchFailure {
                    class: FailureClass::Permanent,
                    attempts,
                    error,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::ScriptedRenderer;
    use tokio::time::Instant;

    fn url() -> Url {
        Url::parse("https://docs.test/guide/page").unwrap()
    }

    fn timeout() -> RenderError {
        RenderError::Timeout("navigation".to_string())
    }

    fn rate_limited() -> RenderError {
        RenderError::RateLimited { status: 429 }
    }

    #[test]
    fn test_retry_classes() {
        assert_eq!(rate_limited().retry_class(), RetryClass::RateLimit);
        assert_eq!(timeout().retry_class(), RetryClass::Timeout);
        assert_eq!(
            RenderError::Failed("boom".to_string()).retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_backoff(0), Duration::from_secs(10));
        assert_eq!(policy.rate_limit_backoff(1), Duration::from_secs(20));
        assert_eq!(policy.rate_limit_backoff(3), Duration::from_secs(80));
        assert_eq!(policy.timeout_backoff(0), Duration::from_secs(1));
        assert_eq!(policy.timeout_backoff(1), Duration::from_secs(2));
        assert_eq!(policy.timeout_backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::default();
        let huge = policy.rate_limit_backoff(200);
        assert!(huge >= policy.rate_limit_backoff(31));
    }

    #[test]
    fn test_policy_from_config() {
        let config = CrawlerConfig {
            max_retries: 5,
            max_rate_limit_retries: Some(2),
            ..CrawlerConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.max_rate_limit_retries, Some(2));
        assert_eq!(policy.rate_limit_base, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let mut renderer = ScriptedRenderer::new().with_page(url().as_str(), "<html></html>");
        let calls = renderer.calls();

        let result = fetch_with_retry(&mut renderer, &url(), &RetryPolicy::default()).await;

        assert_eq!(result.unwrap(), "<html></html>");
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exhausts_after_max_retries() {
        let mut renderer = ScriptedRenderer::new()
            .with_script(url().as_str(), vec![Err(timeout()), Err(timeout()), Err(timeout()), Err(timeout())]);
        let calls = renderer.calls();
        let start = Instant::now();

        let failure = fetch_with_retry(&mut renderer, &url(), &RetryPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(failure.class, FailureClass::TimeoutExhausted);
        assert_eq!(failure.attempts, 3);
        assert_eq!(calls.lock().unwrap().len(), 3);
        // 1s after the first timeout, 2s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success() {
        let mut renderer = ScriptedRenderer::new().with_script(
            url().as_str(),
            vec![Err(timeout()), Ok("<html>ok</html>".to_string())],
        );

        let result = fetch_with_retry(&mut renderer, &url(), &RetryPolicy::default()).await;

        assert_eq!(result.unwrap(), "<html>ok</html>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let mut renderer = ScriptedRenderer::new().with_script(
            url().as_str(),
            vec![
                Err(RenderError::Failed("net::ERR_NAME_NOT_RESOLVED".to_string())),
                Ok("never reached".to_string()),
            ],
        );
        let calls = renderer.calls();

        let failure = fetch_with_retry(&mut renderer, &url(), &RetryPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(failure.class, FailureClass::Permanent);
        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_does_not_count_toward_cap() {
        let mut script: Vec<Result<String, RenderError>> = (0..5).map(|_| Err(rate_limited())).collect();
        script.push(Ok("<html>finally</html>".to_string()));
        let mut renderer = ScriptedRenderer::new().with_script(url().as_str(), script);
        let calls = renderer.calls();
        let start = Instant::now();

        let result = fetch_with_retry(&mut renderer, &url(), &RetryPolicy::default()).await;

        assert_eq!(result.unwrap(), "<html>finally</html>");
        assert_eq!(calls.lock().unwrap().len(), 6);
        // 10 + 20 + 40 + 80 + 160
        assert_eq!(start.elapsed(), Duration::from_secs(310));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_cap_when_configured() {
        let script = (0..10).map(|_| Err(rate_limited())).collect();
        let mut renderer = ScriptedRenderer::new().with_script(url().as_str(), script);
        let policy = RetryPolicy {
            max_rate_limit_retries: Some(2),
            ..RetryPolicy::default()
        };

        let failure = fetch_with_retry(&mut renderer, &url(), &policy)
            .await
            .unwrap_err();

        assert_eq!(failure.class, FailureClass::RateLimitExhausted);
        assert_eq!(failure.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_interleaved_with_timeouts() {
        let mut renderer = ScriptedRenderer::new().with_script(
            url().as_str(),
            vec![
                Err(timeout()),
                Err(rate_limited()),
                Err(timeout()),
                Err(rate_limited()),
                Err(timeout()),
            ],
        );

        let failure = fetch_with_retry(&mut renderer, &url(), &RetryPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(failure.class, FailureClass::TimeoutExhausted);
        assert_eq!(failure.attempts, 5);
    }
}
