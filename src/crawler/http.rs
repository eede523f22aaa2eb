//! Plain HTTP renderer
//!
//! Fetches the server response without executing scripts. Suitable for sites
//! whose pages are rendered server side, and used by the integration tests.

use crate::config::BrowserSettings;
use crate::crawler::fetcher::{PageRenderer, RenderError};
use crate::MirrorError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Builds an HTTP client with the configured user agent and timeout
    pub fn new(settings: &BrowserSettings) -> Result<Self, MirrorError> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.navigation_timeout())
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&mut self, url: &Url) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RenderError::RateLimited {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(RenderError::Failed(format!("HTTP {}", status.as_u16())));
        }

        response.text().await.map_err(classify_reqwest_error)
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout(error.to_string())
    } else {
        RenderError::Failed(error.to_string())
    }
}
