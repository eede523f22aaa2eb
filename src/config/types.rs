use crate::url::Scope;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default crawl host
pub const DEFAULT_BASE_HOST: &str = "developer.apple.com";

/// Default crawl path prefix
pub const DEFAULT_PATH_PREFIX: &str = "/design/human-interface-guidelines";

/// Default seed URL
pub const DEFAULT_START_URL: &str =
    "https://developer.apple.com/design/human-interface-guidelines";

/// Default user agent sent by both engines
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; DocsMirror/1.0; +https://github.com/docs-mirror/docs-mirror)";

/// Main configuration structure for docs-mirror
///
/// Every section and key has a default, so an empty file is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scope: ScopeConfig,
    pub crawler: CrawlerConfig,
    pub browser: BrowserSettings,
    pub output: OutputConfig,
}

impl Config {
    /// The host/path-prefix scope of this crawl
    pub fn scope(&self) -> Scope {
        Scope::new(&self.scope.base_host, &self.scope.path_prefix)
    }
}

/// Crawl scope configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Host (with optional port) every crawled URL must have
    #[serde(rename = "base-host")]
    pub base_host: String,

    /// Path prefix every crawled URL must start with
    #[serde(rename = "path-prefix")]
    pub path_prefix: String,

    /// Seed URL; must be inside the scope
    #[serde(rename = "start-url")]
    pub start_url: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            base_host: DEFAULT_BASE_HOST.to_string(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            start_url: DEFAULT_START_URL.to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Delay after each fetched page (seconds)
    #[serde(rename = "rate-limit-delay")]
    pub rate_limit_delay: f64,

    /// Maximum timed-out attempts per URL before giving up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Optional cap on rate-limit retries per URL (unbounded when unset)
    #[serde(rename = "max-rate-limit-retries")]
    pub max_rate_limit_retries: Option<u32>,

    /// Skip URLs finished by a previous run
    pub resume: bool,
}

impl CrawlerConfig {
    /// Values that do not fit a `Duration` saturate; `validate` rejects them
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_delay).unwrap_or(Duration::MAX)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: 1.0,
            max_retries: 3,
            max_rate_limit_retries: None,
            resume: true,
        }
    }
}

/// Page rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Headless Chrome via the DevTools protocol
    Chromium,
    /// Plain HTTP GET, for statically rendered sites
    Http,
}

/// Browser / fetch engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub engine: Engine,

    /// Run the browser without a window
    pub headless: bool,

    /// Per-attempt navigation timeout (seconds)
    #[serde(rename = "navigation-timeout")]
    pub navigation_timeout: u64,

    /// Quiet period with no new network requests that counts as settled (milliseconds)
    #[serde(rename = "network-idle-ms")]
    pub network_idle_ms: u64,

    /// Extra wait after the network settles, for lazily-loaded content (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Chrome binary; auto-detected when unset
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            engine: Engine::Chromium,
            headless: true,
            navigation_timeout: 30,
            network_idle_ms: 500,
            settle_delay_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_executable: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving page files and the resume manifest
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("hig"),
        }
    }
}
