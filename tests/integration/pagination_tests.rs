//! End-to-end pagination behavior: cap, dedup, ordering and termination

use crate::fixtures::{as_cards, cards, mount_page, review_page, test_config};
use hotel_review_scraper::{ReviewScraper, RunStatus};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_two_pages_capped_at_max_items() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 5);
    let page2 = cards("p2", 5);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), Some(263), Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", review_page(&as_cards(&page2), Some(263), None), 1).await;

    let mut config = test_config(format!("{}/reviews/1", server.uri()));
    config.target.max_items = Some(8);

    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 8);
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.emitted_count, 8);
    assert_eq!(summary.pages_visited, 2);
    assert!(items
        .iter()
        .all(|item| item.hotel_stats.total_reviews == Some(263)));
    assert!(items
        .iter()
        .all(|item| Arc::ptr_eq(&item.hotel_stats, &items[0].hotel_stats)));
    assert_eq!(items[0].hotel_stats.scores["hotel_staff"].score, 9.1);
}

#[tokio::test]
async fn test_emission_follows_page_order() {
    let server = MockServer::start().await;
    let page1 = cards("first", 3);
    let page2 = cards("second", 2);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", review_page(&as_cards(&page2), None, None), 1).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let mut stream = ReviewScraper::new(config).unwrap().stream();

    let mut titles = Vec::new();
    while let Some(item) = stream.next().await {
        titles.push(item.review.title);
    }
    let summary = stream.finish().await.unwrap();

    assert_eq!(
        titles,
        vec![
            "first review 1",
            "first review 2",
            "first review 3",
            "second review 1",
            "second review 2"
        ]
    );
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_overlapping_pages_are_deduplicated() {
    let server = MockServer::start().await;
    let page1 = [
        ("Anna", "2023-01-01", "Lovely"),
        ("Ben", "2023-01-02", "Fine"),
        ("Carla", "2023-01-03", "Great"),
    ];
    // A new review shifted the listing: Carla is served again
    let page2 = [
        ("Carla", "2023-01-03", "Great"),
        ("Dirk", "2023-01-04", "Quiet"),
    ];

    mount_page(&server, "/reviews/1", review_page(&page1, None, Some("/reviews/2")), 1).await;
    mount_page(&server, "/reviews/2", review_page(&page2, None, None), 1).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    let names: Vec<_> = items.iter().map(|i| i.review.guest.name.as_str()).collect();
    assert_eq!(names, vec!["Anna", "Ben", "Carla", "Dirk"]);
    assert_eq!(summary.duplicate_skipped_count, 1);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_stall_guard_stops_repeating_pages() {
    let server = MockServer::start().await;
    let same = cards("loop", 2);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&same), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(
        &server,
        "/reviews/2",
        review_page(&as_cards(&same), None, Some("/reviews/3")),
        1,
    )
    .await;
    mount_page(
        &server,
        "/reviews/3",
        review_page(&as_cards(&same), None, Some("/reviews/4")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/4", review_page(&as_cards(&same), None, None), 0).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.duplicate_skipped_count, 4);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_next_link_back_to_visited_page_ends_run() {
    let server = MockServer::start().await;
    let page1 = cards("a", 2);
    let page2 = cards("b", 2);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(
        &server,
        "/reviews/2",
        review_page(&as_cards(&page2), None, Some("/reviews/1")),
        1,
    )
    .await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_reported_total_ends_run_despite_next_link() {
    let server = MockServer::start().await;
    let page1 = cards("only", 3);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), Some(3), Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", review_page(&[], Some(3), None), 0).await;

    let config = test_config(format!("{}/reviews/1", server.uri()));
    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_offset_fallback_without_next_links() {
    let server = MockServer::start().await;
    let page1 = cards("first", 2);
    let page2 = cards("second", 2);

    for (offset, page) in [("0", &page1), ("2", &page2)] {
        Mock::given(method("GET"))
            .and(path("/reviews"))
            .and(query_param("offset", offset))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(review_page(&as_cards(page), Some(4), None)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = test_config(format!("{}/reviews?offset=0", server.uri()));
    config.pagination.page_size = Some(2);

    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(items[3].review.title, "second review 2");
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_language_filter() {
    let server = MockServer::start().await;
    let body = r#"<html><body><div data-testid="review-list">
        <div data-testid="review-card" lang="de"><h3 data-testid="review-title">Gut</h3></div>
        <div data-testid="review-card" lang="en"><h3 data-testid="review-title">Good</h3></div>
        <div data-testid="review-card" lang="nl"><h3 data-testid="review-title">Goed</h3></div>
        </div></body></html>"#;
    mount_page(&server, "/reviews/1", body.to_string(), 1).await;

    let mut config = test_config(format!("{}/reviews/1", server.uri()));
    config.target.languages = vec!["de".to_string(), "nl".to_string()];

    let (items, summary) = ReviewScraper::new(config).unwrap().collect().await.unwrap();

    let titles: Vec<_> = items.iter().map(|i| i.review.title.as_str()).collect();
    assert_eq!(titles, vec!["Gut", "Goed"]);
    assert_eq!(summary.language_filtered_count, 1);
}

#[tokio::test]
async fn test_cancelled_stream_stops_fetching() {
    let server = MockServer::start().await;
    let page1 = cards("p1", 5);

    mount_page(
        &server,
        "/reviews/1",
        review_page(&as_cards(&page1), None, Some("/reviews/2")),
        1,
    )
    .await;
    mount_page(&server, "/reviews/2", review_page(&as_cards(&page1), None, None), 0).await;

    let mut config = test_config(format!("{}/reviews/1", server.uri()));
    config.pagination.channel_capacity = 3;

    let mut stream = ReviewScraper::new(config).unwrap().stream();
    let first = stream.next().await.unwrap();
    assert_eq!(first.review.title, "p1 review 1");

    stream.cancel();
    let summary = stream.finish().await.unwrap();

    // Items left unread in the buffer were never delivered
    assert_eq!(summary.status, RunStatus::Cancelled);
    assert_eq!(summary.emitted_count, 1);
}
