//! HTML link extraction
//!
//! Collects every `<a href>` in a rendered document, resolves it against the
//! page it was found on and keeps the in-scope ones in normalized form.

use crate::url::{normalize, NormalizedUrl, Scope};
use scraper::{Html, Selector};
use url::Url;

/// Extracts in-scope links from an HTML document
///
/// # Link Extraction Rules
///
/// - Every `<a>` element with an `href` attribute is considered
/// - Relative hrefs are resolved against `current_url`
/// - Hrefs that fail to resolve, or resolve outside `scope`, are dropped
/// - Survivors are normalized (no fragment, no query, no trailing slash)
///
/// Document order is kept and duplicates within one page are not collapsed;
/// the caller deduplicates against its visited set. Malformed markup yields
/// whatever anchors the lenient parser recovers, never an error.
///
/// # Example
///
/// ```
/// use docs_mirror::crawler::extract_links;
/// use docs_mirror::url::Scope;
/// use url::Url;
///
/// let html = r#"<a href="/docs/b">B</a><a href="https://other.com/docs/c">C</a>"#;
/// let page = Url::parse("https://example.com/docs/a").unwrap();
/// let links = extract_links(html, &page, &Scope::new("example.com", "/docs"));
///
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/docs/b");
/// ```
pub fn extract_links(content: &str, current_url: &Url, scope: &Scope) -> Vec<NormalizedUrl> {
    let document = Html::parse_document(content);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = scope.accept(href, current_url) {
                    links.push(normalize(&absolute_url));
                }
            }
        }
    }

    links
}
