//! Scripted renderer shared by the crawler unit tests

use crate::crawler::fetcher::{PageRenderer, RenderError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Serves canned pages and scripted failures keyed by exact URL string
#[derive(Debug, Default)]
pub(crate) struct ScriptedRenderer {
    pages: HashMap<String, String>,
    scripts: HashMap<String, VecDeque<Result<String, RenderError>>>,
    panic_on: Option<String>,
    hang_on: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Always succeed with `content` once any script for the URL is used up
    pub(crate) fn with_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }

    /// Answer the next renders of `url` from `script`, in order
    pub(crate) fn with_script(mut self, url: &str, script: Vec<Result<String, RenderError>>) -> Self {
        self.scripts.insert(url.to_string(), script.into());
        self
    }

    pub(crate) fn panicking_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    /// Never finish rendering `url`
    pub(crate) fn hanging_on(mut self, url: &str) -> Self {
        self.hang_on = Some(url.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn closed(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render(&mut self, url: &Url) -> Result<String, RenderError> {
        let key = url.as_str().to_string();
        self.calls.lock().unwrap().push(key.clone());

        if self.panic_on.as_deref() == Some(key.as_str()) {
            panic!("renderer crashed on {}", key);
        }
        if self.hang_on.as_deref() == Some(key.as_str()) {
            std::future::pending::<()>().await;
        }

        if let Some(next) = self.scripts.get_mut(&key).and_then(|s| s.pop_front()) {
            return next;
        }

        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| RenderError::Failed(format!("no page for {}", key)))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
