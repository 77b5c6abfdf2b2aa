//! Integration tests for the review scraper
//!
//! These tests serve fixture listing pages from a wiremock server and drive
//! the whole pipeline through `ReviewScraper`.

mod failure_tests;
mod fixtures;
mod pagination_tests;
