use std::fmt;
use url::Url;

/// The host + path-prefix restriction that defines which URLs a crawl visits
///
/// The host is compared as an authority: the lowercase host name plus an
/// explicit port when the URL carries a non-default one. So
/// `developer.apple.com` matches `https://developer.apple.com/...` and
/// `127.0.0.1:8080` matches `http://127.0.0.1:8080/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    base_host: String,
    path_prefix: String,
}

impl Scope {
    /// Creates a scope for the given host and path prefix
    pub fn new(base_host: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            base_host: base_host.into().to_lowercase(),
            path_prefix: path_prefix.into(),
        }
    }

    /// The path prefix URLs must start with
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Returns true if an absolute URL belongs to this scope
    ///
    /// Fragments and query strings are ignored.
    pub fn contains(&self, url: &Url) -> bool {
        in_scope(url, &self.base_host, &self.path_prefix)
    }

    /// Resolves `href` against the page it was found on and returns the
    /// absolute URL if it belongs to this scope
    ///
    /// # Examples
    ///
    /// ```
    /// use docs_mirror::url::Scope;
    /// use url::Url;
    ///
    /// let scope = Scope::new("example.com", "/docs");
    /// let page = Url::parse("https://example.com/docs/intro").unwrap();
    ///
    /// assert!(scope.accept("setup#install", &page).is_some());
    /// assert!(scope.accept("https://other.com/docs/setup", &page).is_none());
    /// ```
    pub fn accept(&self, href: &str, current: &Url) -> Option<Url> {
        let absolute = current.join(href.trim()).ok()?;
        self.contains(&absolute).then_some(absolute)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base_host, self.path_prefix)
    }
}

/// Checks an absolute URL against a host and path prefix
///
/// True iff the scheme is HTTP(S), the authority equals `base_host` exactly,
/// and the path starts with `path_prefix`.
pub fn in_scope(url: &Url, base_host: &str, path_prefix: &str) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    match authority(url) {
        Some(host) if host == base_host => url.path().starts_with(path_prefix),
        _ => false,
    }
}

/// Extracts `host[:port]` from a URL, omitting the scheme's default port
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
