//! Fixture pages and configuration shared by the integration tests

use hotel_review_scraper::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One review card: guest name, ISO date and title
pub type Card<'a> = (&'a str, &'a str, &'a str);

/// Configuration pointed at `url` with no request spacing and millisecond
/// backoff
pub fn test_config(url: String) -> Config {
    let mut config = Config::default();
    config.target.url = url;
    config.fetch.min_delay_ms = 0;
    config.fetch.timeout_secs = 5;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 10;
    config
}

/// A review listing page in the `data-testid` layout
pub fn review_page(cards: &[Card<'_>], total_reviews: Option<u32>, next: Option<&str>) -> String {
    let json_ld = total_reviews
        .map(|total| {
            format!(
                r#"<script type="application/ld+json">{{"@type": "Hotel", "aggregateRating": {{"ratingValue": 8.6, "reviewCount": {}}}}}</script>"#,
                total
            )
        })
        .unwrap_or_default();

    let cards_html: String = cards
        .iter()
        .map(|(name, date, title)| {
            format!(
                r#"<div data-testid="review-card" lang="en">
                  <div data-testid="reviewer-name">{name}</div>
                  <div data-testid="reviewer-country">Netherlands</div>
                  <div data-testid="reviewer-type">Couple</div>
                  <span data-testid="review-date"><time datetime="{date}">{date}</time></span>
                  <h3 data-testid="review-title">{title}</h3>
                  <div data-testid="review-score">8,0</div>
                  <div data-testid="review-positive-text">Nice stay</div>
                </div>"#
            )
        })
        .collect();

    let next_html = next
        .map(|href| format!(r#"<a rel="next" href="{}">Next page</a>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html lang="en"><head><title>Guest reviews</title>{json_ld}</head><body>
        <div data-testid="review-score-subscores">
          <div data-testid="review-subscore">
            <span data-testid="review-subscore-title">Hotel staff</span>
            <span data-testid="review-subscore-value">9,1</span>
          </div>
        </div>
        <div data-testid="review-list">{cards_html}</div>
        {next_html}
        </body></html>"#
    )
}

/// A page that is not a review listing, optionally still linking onwards
pub fn broken_page(next: Option<&str>) -> String {
    let next_html = next
        .map(|href| format!(r#"<a rel="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Hotel overview</title></head><body>
        <h1>Something went wrong</h1>{next_html}</body></html>"#
    )
}

/// Cards `prefix-1` .. `prefix-n`, each on its own day
pub fn cards(prefix: &str, n: usize) -> Vec<(String, String, String)> {
    (1..=n)
        .map(|i| {
            (
                format!("{}-guest-{}", prefix, i),
                format!("2023-03-{:02}", i),
                format!("{} review {}", prefix, i),
            )
        })
        .collect()
}

pub fn as_cards(owned: &[(String, String, String)]) -> Vec<Card<'_>> {
    owned
        .iter()
        .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
        .collect()
}

/// Serves `body` at `page_path`, expecting exactly `times` requests
pub async fn mount_page(server: &MockServer, page_path: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(times)
        .mount(server)
        .await;
}
