//! Storage traits and error types
//!
//! This module defines the trait interface for resume-state backends and
//! associated error types.

use crate::url::NormalizedUrl;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for resume-state backends
///
/// A store holds the set of normalized URLs that a previous run finished
/// (saved or permanently failed). The crawl engine loads it once at start and
/// saves it once during teardown.
pub trait ResumeStore {
    /// Loads the visited set
    ///
    /// A store that has never been saved returns an empty set, not an error.
    fn load(&self) -> StorageResult<HashSet<NormalizedUrl>>;

    /// Replaces the persisted visited set with `visited`
    fn save(&self, visited: &HashSet<NormalizedUrl>) -> StorageResult<()>;
}
