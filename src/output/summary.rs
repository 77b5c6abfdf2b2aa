//! Run summary reported when a scrape ends

use crate::state::RunStatus;
use serde::Serialize;

/// Completion report of one scrape run
///
/// Always accompanies the records already delivered, including when the run
/// failed part-way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,

    /// Records delivered to the consumer
    pub emitted_count: usize,

    /// Review cards dropped for lacking score, title and date
    pub skipped_record_count: usize,

    /// Records dropped as re-served duplicates
    pub duplicate_skipped_count: usize,

    /// Records dropped by the language filter
    pub language_filtered_count: usize,

    /// Pages fetched successfully
    pub pages_visited: u32,

    /// Pages that failed to parse
    pub parse_failures: u32,

    /// Reason the run stopped early, if it did
    pub last_error: Option<String>,
}

impl RunSummary {
    /// Summary of a run that ended before any page was processed
    pub fn empty(status: RunStatus) -> Self {
        Self {
            status,
            emitted_count: 0,
            skipped_record_count: 0,
            duplicate_skipped_count: 0,
            language_filtered_count: 0,
            pages_visited: 0,
            parse_failures: 0,
            last_error: None,
        }
    }

    /// Records seen on the pages, before any filtering
    pub fn total_seen(&self) -> usize {
        self.emitted_count
            + self.skipped_record_count
            + self.duplicate_skipped_count
            + self.language_filtered_count
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Scrape Summary ===\n");

    println!("Status: {}", summary.status);
    println!("  Pages visited: {}", summary.pages_visited);
    println!("  Reviews emitted: {}", summary.emitted_count);
    println!();

    println!("Dropped:");
    println!("  Incomplete cards: {}", summary.skipped_record_count);
    println!("  Duplicates: {}", summary.duplicate_skipped_count);
    println!("  Other languages: {}", summary.language_filtered_count);
    println!("  Unparseable pages: {}", summary.parse_failures);
    println!();

    if let Some(error) = &summary.last_error {
        println!("Last error: {}", error);
    }
}
