//! Text and value extraction helpers shared by the review and stats parsers

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

fn decimal_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").ok()).as_ref()
}

fn count_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // Thousands may be grouped with ',', '.', a space or a no-break space
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:[.,\u{a0} ]\d{3})+|\d+").ok())
        .as_ref()
}

/// Element text with runs of whitespace collapsed to single spaces
pub fn clean_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The machine-readable `content` attribute if present, else the text
pub fn content_or_text(element: ElementRef<'_>) -> String {
    element
        .value()
        .attr("content")
        .map(collapse_whitespace)
        .unwrap_or_else(|| clean_text(element))
}

/// First decimal number in the text; decimal commas are accepted
///
/// "Scored 8,7" gives 8.7.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let found = decimal_regex()?.find(text)?;
    found.as_str().replace(',', ".").parse().ok()
}

/// First whole count in the text, thousands separators removed
///
/// "Based on 1,234 reviews" gives 1234.
pub fn parse_count(text: &str) -> Option<u32> {
    count_regex()?
        .find(text)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()
}

/// Machine-readable date or datetime to a UNIX timestamp (UTC)
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) and `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    parse_date(value).map(midnight_timestamp)
}

/// Machine-readable date (or the date part of a datetime)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Human-readable English review date, e.g. "Reviewed: 26 August 2022"
///
/// Other locales are not attempted; localized month names are too
/// ambiguous to map reliably.
pub fn parse_review_date_text(text: &str) -> Option<i64> {
    let text = match text.rsplit_once(':') {
        Some((_, rest)) => rest,
        None => text,
    };
    let text = collapse_whitespace(text.trim().trim_end_matches('.'));

    ["%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok())
        .map(midnight_timestamp)
}

/// Lowercase primary subtag of a language tag ("en-GB" gives "en")
pub fn normalize_language(tag: &str) -> Option<String> {
    let primary = tag.trim().split(['-', '_']).next()?.to_lowercase();
    let valid = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_lowercase());
    valid.then_some(primary)
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}
