use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped from the target URL
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "aid",
    "label",
    "sid",
];

/// Parses and normalizes the hotel's review listing URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a host
/// 4. Remove the fragment
/// 5. Remove tracking and session query parameters, keeping the order of
///    the remaining ones (listing filters such as `r_lang` must survive)
///
/// # Examples
///
/// ```
/// use hotel_review_scraper::url::parse_target_url;
///
/// let url = parse_target_url("https://www.booking.com/reviews/x.html?utm_source=a&r_lang=en#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.booking.com/reviews/x.html?r_lang=en");
/// ```
pub fn parse_target_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Returns a copy of `url` with `key` set to `value`, replacing any existing
/// occurrences of `key` and leaving the other parameters untouched
pub fn with_query_param(url: &Url, key: &str, value: &str) -> Url {
    let mut updated = url.clone();
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    updated
        .query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair(key, value);
    updated
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
