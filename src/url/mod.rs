//! URL handling module for docs-mirror
//!
//! This module provides URL normalization and the host/path-prefix scope
//! filter. Both are pure functions; the normalized form is the only identity
//! key used by the visited set, the frontier checks and the resume manifest.

mod normalize;
mod scope;

pub use normalize::{normalize, normalize_url};
pub use scope::{authority, in_scope, Scope};

use crate::UrlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// An absolute URL reduced to scheme + host + path
///
/// Construct with [`normalize`] or [`normalize_url`]. Serializes as a plain
/// string and orders lexicographically by that string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for NormalizedUrl {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize_url(&value)
    }
}

impl From<NormalizedUrl> for String {
    fn from(value: NormalizedUrl) -> Self {
        value.0.into()
    }
}

impl From<NormalizedUrl> for Url {
    fn from(value: NormalizedUrl) -> Self {
        value.0
    }
}

impl AsRef<Url> for NormalizedUrl {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}
