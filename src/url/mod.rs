//! URL handling module
//!
//! This module provides target URL normalization, resolution of pagination
//! links found in review pages, and query rewriting for offset cursors.

mod normalize;

use url::Url;

// Re-export main functions
pub use normalize::{parse_target_url, with_query_param};

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - hrefs that fail to resolve
/// - non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use hotel_review_scraper::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/reviews/hotel.html").unwrap();
/// let next = resolve_link("?offset=10", &base).unwrap();
/// assert_eq!(next.as_str(), "https://example.com/reviews/hotel.html?offset=10");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute)
}

/// Returns true for an absolute http(s) URL with a host
pub fn is_absolute_http(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map_or(false, |h| !h.is_empty())
        })
        .unwrap_or(false)
}
