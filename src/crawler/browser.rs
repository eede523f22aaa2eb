//! Headless Chrome renderer
//!
//! One browser process and one page are opened at launch and reused for every
//! URL of the crawl. Each render navigates the page, waits until the network
//! has been quiet for the configured window, pauses for lazily-loaded content
//! and then serializes the live DOM.

use crate::config::BrowserSettings;
use crate::crawler::fetcher::{PageRenderer, RenderError};
use crate::MirrorError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// HTTP status of the current document, or 0 when the browser does not expose it
const DOCUMENT_STATUS_SCRIPT: &str = r#"
    (function() {
        const entry = performance.getEntriesByType('navigation')[0];
        return entry && typeof entry.responseStatus === 'number' ? entry.responseStatus : 0;
    })()
"#;

const LOAD_STATE_SCRIPT: &str = r#"
    (function() {
        return {
            readyState: document.readyState,
            resources: performance.getEntriesByType('resource').length
        };
    })()
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadState {
    ready_state: String,
    resources: u64,
}

/// Renderer backed by a single headless Chrome session
pub struct ChromiumRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    network_idle: Duration,
    settle_delay: Duration,
    closed: bool,
}

impl ChromiumRenderer {
    /// Launches Chrome and opens the page reused for the whole crawl
    ///
    /// # Returns
    ///
    /// * `Ok(ChromiumRenderer)` - Browser running with a blank page
    /// * `Err(MirrorError::Browser)` - Chrome could not be found, started or driven
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, MirrorError> {
        tracing::info!(
            "Launching browser ({})",
            if settings.headless { "headless" } else { "visible" }
        );

        let mut builder = BrowserConfig::builder()
            .request_timeout(settings.navigation_timeout())
            .window_size(1920, 1080)
            .arg(format!("--user-agent={}", settings.user_agent))
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| MirrorError::Browser(format!("Failed to build browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| MirrorError::Browser(format!("Failed to launch browser: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
            tracing::debug!("Browser event handler task completed");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(MirrorError::Browser(format!("Failed to open page: {e}")));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: settings.navigation_timeout(),
            network_idle: settings.network_idle(),
            settle_delay: settings.settle_delay(),
            closed: false,
        })
    }

    async fn navigate(&self, url: &Url) -> Result<(), RenderError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url.as_str())).await {
            Err(_) => Err(RenderError::Timeout(format!(
                "navigation exceeded {}s",
                self.navigation_timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(classify_cdp_error(e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn document_status(&self) -> Option<u16> {
        let result = self.page.evaluate(DOCUMENT_STATUS_SCRIPT).await.ok()?;
        let status: u16 = result.into_value().ok()?;
        (status != 0).then_some(status)
    }

    /// Polls until the document is complete and no new resource entries have
    /// appeared for `network_idle`
    async fn wait_for_network_idle(&self, deadline: Instant) -> Result<(), RenderError> {
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(RenderError::Timeout(format!(
                    "network did not settle within {}s",
                    self.navigation_timeout.as_secs()
                )));
            }

            match self.page.evaluate(LOAD_STATE_SCRIPT).await {
                Ok(result) => {
                    if let Ok(state) = result.into_value::<LoadState>() {
                        if last_count != Some(state.resources) {
                            last_count = Some(state.resources);
                            quiet_since = now;
                        } else if state.ready_state == "complete"
                            && now.duration_since(quiet_since) >= self.network_idle
                        {
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!("Failed to read load state: {}, retrying", e);
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&mut self, url: &Url) -> Result<String, RenderError> {
        let deadline = Instant::now() + self.navigation_timeout;

        self.navigate(url).await?;

        if let Some(status) = self.document_status().await {
            if status == 429 {
                return Err(RenderError::RateLimited { status });
            }
            tracing::debug!("{} answered HTTP {}", url, status);
        }

        self.wait_for_network_idle(deadline).await?;
        tokio::time::sleep(self.settle_delay).await;

        self.page.content().await.map_err(classify_cdp_error)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();

        result
            .map(|_| ())
            .map_err(|e| RenderError::Failed(format!("Failed to close browser: {e}")))
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Maps protocol errors onto the retry classification
fn classify_cdp_error(error: CdpError) -> RenderError {
    let message = error.to_string();
    // CDP reports navigation net errors (net::ERR_*) only as message text
    if matches!(error, CdpError::Timeout)
        || message.contains("ERR_TIMED_OUT")
        || message.contains("ERR_CONNECTION_TIMED_OUT")
    {
        RenderError::Timeout(message)
    } else {
        RenderError::Failed(message)
    }
}
