//! End-to-end failure handling: bad pages, blocks and fatal HTTP errors

use crate::fixtures::{as_cards, broken_page, cards, mount_page, review_page, test_config};
use hotel_review_scraper::config::Config;
use hotel_review_scraper::{ConfigError, ReviewScraper, RunStatus};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_single_bad_page_between_good_pages() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 3);
    let page3 = cards("p3", 3);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", broken_page(Some("/reviews/3")), 1).await;
    mount_page(&server, "/reviews/3", review_page(&as_cards(&page3), None, None), 1).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 6);
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.pages_visited, 3);
}

#[tokio::test]
async fn test_three_consecutive_bad_pages_is_partial_failure() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 4);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", broken_page(Some("/reviews/3")), 1).await;
    mount_page(&server, "/reviews/3", broken_page(Some("/reviews/4")), 1).await;
    mount_page(&server, "/reviews/4", broken_page(Some("/reviews/5")), 1).await;
    mount_page(&server, "/reviews/5", review_page(&as_cards(&page1), None, None), 0).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(summary.status, RunStatus::PartialFailure);
    assert_eq!(summary.parse_failures, 3);
    assert!(summary
        .last_error
        .as_deref()
        .unwrap()
        .contains("not a review listing"));
}

#[tokio::test]
async fn test_bad_page_without_way_forward_is_partial_failure() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 2);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", broken_page(None), 1).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(summary.status, RunStatus::PartialFailure);
}

#[tokio::test]
async fn test_blocked_second_page_fails_after_retry_budget() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 5);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), Some(263), Some("/reviews/2")),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/reviews/2"))
        .respond_with(ResponseTemplate::new(429))
        .expect(5)
        .mount(&server)
        .await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 5);
    assert_eq!(summary.emitted_count, 5);
    assert_eq!(summary.status, RunStatus::Failed);
    assert!(summary.last_error.as_deref().unwrap().starts_with("blocked"));
}

#[tokio::test]
async fn test_slow_page_times_out_after_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reviews/1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(format!("{}/reviews/1", server.uri()));
    config.fetch.timeout_secs = 1;
    config.retry.max_attempts = 2;
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert!(items.is_empty());
    assert_eq!(summary.status, RunStatus::Failed);
    assert!(summary.last_error.as_deref().unwrap().starts_with("timeout"));
}

#[tokio::test]
async fn test_overview_page_without_reviews_is_not_silent() {
    let server = MockServer::start().await;
    let overview = r#"<html><head><title>Canal House</title>
        <script type="application/ld+json">{"@type": "Hotel", "aggregateRating": {"reviewCount": 263}}</script>
        </head><body><h1>Canal House</h1></body></html>"#;

    mount_page(&server, "/hotel", overview.to_string(), 1).await;

    let config = test_config(format!("{}/hotel", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert!(items.is_empty());
    assert_eq!(summary.status, RunStatus::PartialFailure);
    assert_eq!(summary.parse_failures, 1);
    assert!(summary.last_error.is_some());
}

#[tokio::test]
async fn test_challenge_page_is_retried() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 2);

    // First request gets a challenge interstitial, the retry gets the page
    Mock::given(method("GET"))
        .and(path("/reviews/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Just a moment...</title></head><body></body></html>",
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/reviews/1", review_page(&as_cards(&page1), None, None), 1).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_server_error_recovers_within_budget() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 2);

    Mock::given(method("GET"))
        .and(path("/reviews/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/reviews/1", review_page(&as_cards(&page1), None, None), 1).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reviews/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert!(items.is_empty());
    assert_eq!(summary.status, RunStatus::Failed);
    assert!(summary.last_error.as_deref().unwrap().contains("HTTP 404"));
}

#[test]
fn test_missing_target_is_rejected_before_any_request() {
    let result = ReviewScraper::new(Config::default());
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_zero_retry_budget_is_rejected() {
    let mut config = test_config("https://example.com/reviews".to_string());
    config.retry.max_attempts = 0;
    assert!(matches!(
        ReviewScraper::new(config),
        Err(ConfigError::Validation(_))
    ));
}
