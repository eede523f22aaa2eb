use crate::url::NormalizedUrl;
use crate::UrlError;
use url::Url;

/// Reduces an absolute URL to its canonical crawl identity
///
/// # Normalization Steps
///
/// 1. Remove fragment (everything after #)
/// 2. Remove the query string entirely
/// 3. Remove trailing slashes, unless the path is exactly `/`
///
/// Scheme, host (including an explicit port) and path are preserved. The
/// operation is idempotent, so a normalized URL normalizes to itself.
///
/// # Examples
///
/// ```
/// use docs_mirror::url::normalize;
/// use url::Url;
///
/// let url = Url::parse("http://h/a/b?q=1#frag").unwrap();
/// assert_eq!(normalize(&url).as_str(), "http://h/a/b");
/// ```
pub fn normalize(url: &Url) -> NormalizedUrl {
    let mut url = url.clone();

    url.set_fragment(None);
    url.set_query(None);

    let path = url.path();
    if path != "/" && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    NormalizedUrl(url)
}

/// Parses and normalizes a URL string
///
/// Only absolute `http` and `https` URLs with a host are accepted.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(NormalizedUrl)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse the URL, or it is not a web URL
///
/// # Examples
///
/// ```
/// use docs_mirror::url::normalize_url;
///
/// let url = normalize_url("https://example.com/docs/page/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<NormalizedUrl, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(normalize(&url))
}
