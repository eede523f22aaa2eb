//! On-disk layout of mirrored pages
//!
//! Each normalized URL maps to exactly one `index.html`, nested so that the
//! output tree mirrors the URL hierarchy below the scope prefix:
//!
//! | URL path                                   | File                        |
//! |--------------------------------------------|-----------------------------|
//! | `<prefix>`                                 | `<out>/index.html`          |
//! | `<prefix>/components`                      | `<out>/components/index.html` |
//! | `<prefix>/platforms/ios`                   | `<out>/platforms/ios/index.html` |

use crate::url::NormalizedUrl;
use std::path::{Path, PathBuf};

/// File name used for every mirrored page
pub const PAGE_FILE_NAME: &str = "index.html";

/// Maps a normalized URL to its page file below `output_dir`
///
/// Pure: the same URL always maps to the same path. A path that does not
/// carry `path_prefix` maps from its full path.
pub fn page_file_path(url: &NormalizedUrl, path_prefix: &str, output_dir: &Path) -> PathBuf {
    let path = url.path();
    let relative = path.strip_prefix(path_prefix).unwrap_or(path);
    let relative = relative.trim_matches('/');

    if relative.is_empty() {
        return output_dir.join(PAGE_FILE_NAME);
    }

    let mut file = output_dir.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        file.push(segment);
    }
    file.push(PAGE_FILE_NAME);
    file
}

/// Writes a rendered document, creating parent directories as needed
pub async fn write_page(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content.as_bytes()).await
}
