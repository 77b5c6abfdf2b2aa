//! Next-page discovery

use crate::crawler::parser::text::clean_text;
use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Finds the site's "next page" link and resolves it against the page URL
///
/// Strategies, in order:
/// 1. `<a rel="next">` / `<link rel="next">`
/// 2. any anchor whose `aria-label` or text mentions "next"
/// 3. the `review-paginator-next` anchor
///
/// Anchors marked `aria-disabled="true"` are ignored.
pub fn find_next_page(document: &Html, base_url: &Url) -> Option<Url> {
    if let Ok(selector) = Selector::parse(r#"a[rel~="next"][href], link[rel~="next"][href]"#) {
        if let Some(url) = document.select(&selector).find_map(|a| resolve(a, base_url)) {
            tracing::trace!("Next page from rel=next: {}", url);
            return Some(url);
        }
    }

    if let Ok(selector) = Selector::parse("a[href]") {
        let by_label = document.select(&selector).find_map(|a| {
            let aria = a.value().attr("aria-label").unwrap_or("").to_lowercase();
            let text = clean_text(a).to_lowercase();
            if aria.contains("next") || text.contains("next") {
                resolve(a, base_url)
            } else {
                None
            }
        });
        if let Some(url) = by_label {
            tracing::trace!("Next page from aria/text match: {}", url);
            return Some(url);
        }
    }

    if let Ok(selector) = Selector::parse(r#"a[data-testid="review-paginator-next"][href]"#) {
        if let Some(url) = document.select(&selector).find_map(|a| resolve(a, base_url)) {
            tracing::trace!("Next page from paginator: {}", url);
            return Some(url);
        }
    }

    None
}

fn resolve(anchor: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    let element = anchor.value();
    if element
        .attr("aria-disabled")
        .map_or(false, |v| v.eq_ignore_ascii_case("true"))
    {
        return None;
    }
    element.attr("href").and_then(|href| resolve_link(href, base_url))
}
