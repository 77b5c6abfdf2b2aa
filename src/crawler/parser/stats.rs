//! Hotel-level statistics extraction
//!
//! The review count comes from JSON-LD when the page embeds it, otherwise
//! from the visible score subtitle. Category scores come from the subscore
//! blocks.

use crate::crawler::parser::text::{clean_text, content_or_text, parse_count, parse_decimal};
use crate::model::{normalize_score_label, HotelStats, ScoreBounds, ScoreEntry};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

/// Schema.org types whose aggregate rating describes the hotel
const LODGING_TYPES: &[&str] = &["hotel", "lodgingbusiness"];

/// Extracts hotel statistics from a listing page
///
/// Returns an empty `HotelStats` when the page has none; the caller decides
/// whether that counts as absent.
pub fn extract_hotel_stats(document: &Html) -> HotelStats {
    let mut stats = HotelStats {
        total_reviews: total_from_json_ld(document),
        ..Default::default()
    };

    if stats.total_reviews.is_none() {
        stats.total_reviews = total_from_markup(document);
    }

    if let (Ok(block), Ok(title), Ok(value)) = (
        Selector::parse(r#"[data-testid="review-subscore"]"#),
        Selector::parse(r#"[data-testid="review-subscore-title"]"#),
        Selector::parse(r#"[data-testid="review-subscore-value"]"#),
    ) {
        for element in document.select(&block) {
            let label = element.select(&title).next().map(clean_text).unwrap_or_default();
            let value_node = element.select(&value).next();
            let score = value_node.map(clean_text).as_deref().and_then(parse_decimal);

            let (false, Some(score), Some(value_node)) = (label.is_empty(), score, value_node) else {
                continue;
            };

            stats.scores.insert(
                normalize_score_label(&label),
                ScoreEntry {
                    score,
                    translation: label,
                    bounds: read_bounds(element, value_node),
                },
            );
        }
    }

    stats
}

/// Bounds may sit on the block or on the value node
fn read_bounds(block: ElementRef<'_>, value: ElementRef<'_>) -> ScoreBounds {
    let read = |attr: &str| {
        value
            .value()
            .attr(attr)
            .or_else(|| block.value().attr(attr))
            .and_then(parse_decimal)
    };

    ScoreBounds {
        lower: read("data-lower"),
        higher: read("data-higher"),
    }
}

fn total_from_markup(document: &Html) -> Option<u32> {
    [
        r#"[data-testid="review-score-subtitle"]"#,
        r#"[itemprop="aggregateRating"] [itemprop="reviewCount"]"#,
    ]
    .iter()
    .filter_map(|css| Selector::parse(css).ok())
    .find_map(|selector| {
        document
            .select(&selector)
            .next()
            .and_then(|node| parse_count(&content_or_text(node)))
    })
}

fn total_from_json_ld(document: &Html) -> Option<u32> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    document.select(&selector).find_map(|script| {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => review_count_in(&value),
            Err(e) => {
                tracing::debug!("Skipping unparseable JSON-LD block: {}", e);
                None
            }
        }
    })
}

/// Walks top-level arrays and `@graph` lists looking for a lodging entity
fn review_count_in(value: &Value) -> Option<u32> {
    match value {
        Value::Array(items) => items.iter().find_map(review_count_in),
        Value::Object(map) => {
            if let Some(count) = is_lodging(value)
                .then(|| map.get("aggregateRating"))
                .flatten()
                .and_then(|rating| rating.get("reviewCount").or_else(|| rating.get("ratingCount")))
                .and_then(json_count)
            {
                return Some(count);
            }
            map.get("@graph").and_then(review_count_in)
        }
        _ => None,
    }
}

fn is_lodging(value: &Value) -> bool {
    let matches = |t: &Value| {
        t.as_str()
            .map(|s| LODGING_TYPES.contains(&s.to_lowercase().as_str()))
            .unwrap_or(false)
    };

    match value.get("@type") {
        Some(Value::Array(types)) => types.iter().any(matches),
        Some(t) => matches(t),
        None => false,
    }
}

/// Review counts appear both as numbers and as strings
fn json_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_from_json_ld_object() {
        let html = Html::parse_document(
            r#"<html><head><script type="application/ld+json">
            {"@type": "Hotel", "name": "Canal House", "aggregateRating": {"ratingValue": 8.7, "reviewCount": 263}}
            </script></head><body></body></html>"#,
        );
        assert_eq!(extract_hotel_stats(&html).total_reviews, Some(263));
    }

    #[test]
    fn test_total_from_json_ld_graph_and_string_count() {
        let html = Html::parse_document(
            r#"<html><head><script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "BreadcrumbList"},
                {"@type": ["LodgingBusiness"], "aggregateRating": {"ratingCount": "1,024"}}
            ]}
            </script></head><body></body></html>"#,
        );
        assert_eq!(extract_hotel_stats(&html).total_reviews, Some(1024));
    }

    #[test]
    fn test_ignores_non_lodging_json_ld() {
        let html = Html::parse_document(
            r#"<html><head><script type="application/ld+json">
            {"@type": "Organization", "aggregateRating": {"reviewCount": 99}}
            </script><script type="application/ld+json">{not json</script></head><body></body></html>"#,
        );
        assert_eq!(extract_hotel_stats(&html).total_reviews, None);
    }

    #[test]
    fn test_total_from_subtitle() {
        let html = Html::parse_document(
            r#"<html><body><div data-testid="review-score-subtitle">Based on 263 reviews</div></body></html>"#,
        );
        assert_eq!(extract_hotel_stats(&html).total_reviews, Some(263));
    }

    #[test]
    fn test_subscores_with_bounds() {
        let html = Html::parse_document(
            r#"<html><body>
            <div data-testid="review-subscore">
                <span data-testid="review-subscore-title">Hotel staff</span>
                <span data-testid="review-subscore-value" data-lower="8.9" data-higher="9.4">9,1</span>
            </div>
            <div data-testid="review-subscore">
                <span data-testid="review-subscore-title">Value for money</span>
                <span data-testid="review-subscore-value">7.8</span>
            </div>
            <div data-testid="review-subscore">
                <span data-testid="review-subscore-title">Broken</span>
                <span data-testid="review-subscore-value">-</span>
            </div>
            </body></html>"#,
        );
        let stats = extract_hotel_stats(&html);

        assert_eq!(stats.scores.len(), 2);
        let staff = &stats.scores["hotel_staff"];
        assert_eq!(staff.score, 9.1);
        assert_eq!(staff.translation, "Hotel staff");
        assert_eq!(staff.bounds.lower, Some(8.9));
        assert_eq!(staff.bounds.higher, Some(9.4));

        let value = &stats.scores["value_for_money"];
        assert_eq!(value.bounds, ScoreBounds::default());
    }

    #[test]
    fn test_empty_page_has_empty_stats() {
        let html = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert!(extract_hotel_stats(&html).is_empty());
    }
}
