//! Storage module for persisting resume state
//!
//! This module handles the resume manifest that lets an interrupted crawl
//! skip work a previous run already finished.

mod manifest;
mod traits;

pub use manifest::{JsonManifest, MANIFEST_FILE_NAME};
pub use traits::{ResumeStore, StorageError, StorageResult};

use crate::url::NormalizedUrl;
use std::collections::HashSet;

/// Loads the visited set, degrading to an empty set on any failure
///
/// A corrupt or unreadable manifest means a fresh crawl, never a crash.
pub fn load_or_empty(store: &dyn ResumeStore) -> HashSet<NormalizedUrl> {
    match store.load() {
        Ok(visited) => visited,
        Err(e) => {
            tracing::warn!("Could not load visited URLs: {}", e);
            HashSet::new()
        }
    }
}

/// Saves the visited set, logging instead of failing
///
/// Returns true if the state was persisted.
pub fn save_or_warn(store: &dyn ResumeStore, visited: &HashSet<NormalizedUrl>) -> bool {
    match store.save(visited) {
        Ok(()) => {
            tracing::debug!("Saved {} visited URLs", visited.len());
            true
        }
        Err(e) => {
            tracing::warn!("Could not save visited URLs: {}", e);
            false
        }
    }
}
