//! JSON resume manifest
//!
//! The manifest lives at `<output>/.visited.json` and holds a pretty-printed
//! JSON array of normalized URL strings, sorted lexicographically.

use crate::storage::{ResumeStore, StorageError, StorageResult};
use crate::url::NormalizedUrl;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name of the manifest inside the output directory
pub const MANIFEST_FILE_NAME: &str = ".visited.json";

/// Resume store backed by a JSON file in the output directory
#[derive(Debug, Clone)]
pub struct JsonManifest {
    path: PathBuf,
}

impl JsonManifest {
    /// Creates a manifest store for the given output directory
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(MANIFEST_FILE_NAME),
        }
    }

    /// Creates a manifest store at an explicit file path
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl ResumeStore for JsonManifest {
    fn load(&self) -> StorageResult<HashSet<NormalizedUrl>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let urls: Vec<NormalizedUrl> = serde_json::from_str(&content)?;

        Ok(urls.into_iter().collect())
    }

    fn save(&self, visited: &HashSet<NormalizedUrl>) -> StorageResult<()> {
        let mut sorted: Vec<&NormalizedUrl> = visited.iter().collect();
        sorted.sort();

        let json = serde_json::to_string_pretty(&sorted)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;

        Ok(())
    }
}
