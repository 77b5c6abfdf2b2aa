//! Pagination controller - the page loop of a scrape run
//!
//! The controller owns the cursor and every termination decision. For each
//! page it:
//! 1. Fetches the page, retrying retriable failures with backoff
//! 2. Parses it into records and, on page 1, hotel statistics
//! 3. Hands records to assembly and emits accepted ones immediately
//! 4. Decides whether to stop or which page comes next
//!
//! All state of a run lives in one `PaginationController`, so several runs
//! for different hotels can proceed side by side.

use crate::config::{validate, Config, PaginationConfig};
use crate::crawler::assembly::{Admission, Assembler};
use crate::crawler::backoff::Backoff;
use crate::crawler::cursor::PageCursor;
use crate::crawler::emitter::{Disconnected, Emitter, ReviewStream};
use crate::crawler::fetcher::{FetchError, FetchPolicy, PageFetcher, RawPage};
use crate::crawler::parser::{ParsedPage, ReviewParser};
use crate::model::ReviewItem;
use crate::output::RunSummary;
use crate::state::{ControllerState, RunStatus};
use crate::url::parse_target_url;
use crate::{ConfigError, ScrapeError};
use std::collections::HashSet;
use url::Url;

/// Why the page loop stopped before reaching a normal end
enum Interrupt {
    /// The consumer went away
    Cancelled,
    /// The page could not be fetched within the retry budget
    Fetch(FetchError),
}

/// State of one run's page loop
pub struct PaginationController {
    fetcher: PageFetcher,
    parser: ReviewParser,
    assembler: Assembler,
    backoff: Backoff,
    emitter: Emitter,
    settings: PaginationConfig,
    state: ControllerState,
    visited: HashSet<Url>,
    pages_visited: u32,
    parse_failures: u32,
    consecutive_parse_failures: u32,
    stalled_pages: u32,
    skipped_records: usize,
    records_seen: usize,
    delivered: usize,
    last_error: Option<String>,
}

impl PaginationController {
    /// Creates a controller
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher carrying the run's HTTP client and rate limit
    /// * `parser` - Page parser
    /// * `assembler` - Dedup and cap state for the run
    /// * `backoff` - Retry policy
    /// * `settings` - Stall, parse-failure and offset-fallback policy
    /// * `emitter` - Where accepted reviews go
    pub fn new(
        fetcher: PageFetcher,
        parser: ReviewParser,
        assembler: Assembler,
        backoff: Backoff,
        settings: PaginationConfig,
        emitter: Emitter,
    ) -> Self {
        Self {
            fetcher,
            parser,
            assembler,
            backoff,
            emitter,
            settings,
            state: ControllerState::Init,
            visited: HashSet::new(),
            pages_visited: 0,
            parse_failures: 0,
            consecutive_parse_failures: 0,
            stalled_pages: 0,
            skipped_records: 0,
            records_seen: 0,
            delivered: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Runs the page loop from `start` to a terminal state
    ///
    /// The emitter is closed when this returns.
    pub async fn run(mut self, start: PageCursor) -> RunSummary {
        tracing::info!("Starting review scrape at {}", start.url());

        let status = self.drive(start).await;

        tracing::info!(
            "Scrape {} after {} pages: {} emitted, {} duplicates, {} skipped",
            status,
            self.pages_visited,
            self.delivered,
            self.assembler.duplicate_skipped(),
            self.skipped_records
        );

        let summary = RunSummary {
            status,
            emitted_count: self.delivered,
            skipped_record_count: self.skipped_records,
            duplicate_skipped_count: self.assembler.duplicate_skipped(),
            language_filtered_count: self.assembler.language_filtered(),
            pages_visited: self.pages_visited,
            parse_failures: self.parse_failures,
            last_error: self.last_error,
        };
        self.emitter.close();
        summary
    }

    async fn drive(&mut self, start: PageCursor) -> RunStatus {
        self.transition(ControllerState::Fetching);
        let mut cursor = start;

        loop {
            self.visited.insert(cursor.url().clone());

            let page = match self.fetch_page(&cursor).await {
                Ok(page) => page,
                Err(Interrupt::Cancelled) => return self.cancelled(),
                Err(Interrupt::Fetch(e)) => {
                    tracing::error!("Giving up on page {}: {}", cursor.page(), e);
                    self.last_error = Some(e.to_string());
                    self.transition(ControllerState::Failed);
                    return RunStatus::Failed;
                }
            };
            self.pages_visited += 1;
            self.visited.insert(page.url.clone());

            self.transition(ControllerState::Parsing);
            let next = match self.parser.parse(&page) {
                Ok(parsed) => {
                    self.consecutive_parse_failures = 0;
                    match self.process_page(&cursor, parsed).await {
                        Ok(next) => next,
                        Err(Disconnected) => return self.cancelled(),
                    }
                }
                Err(e) => {
                    self.parse_failures += 1;
                    self.consecutive_parse_failures += 1;
                    tracing::warn!(
                        "Page {} failed to parse ({} in a row): {}",
                        cursor.page(),
                        self.consecutive_parse_failures,
                        e
                    );
                    self.last_error = Some(e.to_string());

                    if self.consecutive_parse_failures >= self.settings.max_consecutive_parse_failures
                    {
                        tracing::error!(
                            "Stopping after {} consecutive unparseable pages",
                            self.consecutive_parse_failures
                        );
                        self.transition(ControllerState::Failed);
                        return RunStatus::PartialFailure;
                    }

                    match self.step_over(&cursor, &page) {
                        Some(next) => {
                            self.transition(ControllerState::Advancing);
                            Some(next)
                        }
                        None => {
                            tracing::error!("No way past unparseable page {}", cursor.page());
                            self.transition(ControllerState::Failed);
                            return RunStatus::PartialFailure;
                        }
                    }
                }
            };

            match next {
                Some(next) => {
                    self.transition(ControllerState::Fetching);
                    cursor = next;
                }
                None => {
                    self.transition(ControllerState::Done);
                    return RunStatus::Completed;
                }
            }
        }
    }

    /// Fetches one page within the retry budget
    ///
    /// Both the request and the backoff sleep are abandoned as soon as the
    /// consumer disconnects.
    async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<RawPage, Interrupt> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = self.emitter.closed() => return Err(Interrupt::Cancelled),
                result = self.fetcher.fetch(cursor) => result,
            };

            let error = match result {
                Ok(page) => return Ok(page),
                Err(e) => e,
            };

            if !error.retriable || !self.backoff.should_retry(attempt) {
                return Err(Interrupt::Fetch(error));
            }

            let delay = self.backoff.delay_for(attempt, error.kind);
            tracing::warn!(
                "Attempt {}/{} for page {} failed ({}), retrying in {:?}",
                attempt,
                self.backoff.max_attempts(),
                cursor.page(),
                error,
                delay
            );
            self.transition(ControllerState::Fetching);

            tokio::select! {
                biased;
                _ = self.emitter.closed() => return Err(Interrupt::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Assembles and emits a parsed page, then picks the next cursor
    ///
    /// Records are emitted one by one as assembly accepts them.
    async fn process_page(
        &mut self,
        cursor: &PageCursor,
        parsed: ParsedPage,
    ) -> Result<Option<PageCursor>, Disconnected> {
        self.transition(ControllerState::Advancing);

        let ParsedPage {
            records,
            stats,
            next_page,
            skipped_records,
            dialect,
            ..
        } = parsed;

        tracing::debug!(
            "Page {}: {} records, {} skipped, dialect {:?}",
            cursor.page(),
            records.len(),
            skipped_records,
            dialect
        );

        if let Some(stats) = stats {
            if self.assembler.stats().is_none() {
                self.assembler.freeze_stats(stats);
            }
        }

        let on_page = records.len() + skipped_records;
        self.skipped_records += skipped_records;
        self.records_seen += on_page;

        let emitted_before = self.assembler.emitted();
        for record in records {
            match self.assembler.accept(record) {
                Admission::Accepted(item) => {
                    self.emitter.emit(item).await?;
                    self.delivered += 1;
                }
                Admission::CapReached => break,
                Admission::Duplicate | Admission::Filtered => {}
            }
        }

        let emitted_now = self.assembler.emitted() > emitted_before;
        Ok(self.advance(cursor, next_page, on_page, emitted_now))
    }

    /// Termination checks after a parsed page, in order: cap, stall,
    /// exhausted count, next link, offset fallback
    fn advance(
        &mut self,
        cursor: &PageCursor,
        next_page: Option<Url>,
        on_page: usize,
        emitted_now: bool,
    ) -> Option<PageCursor> {
        if self.assembler.is_capped() {
            tracing::info!("Item cap reached on page {}", cursor.page());
            return None;
        }

        if emitted_now {
            self.stalled_pages = 0;
        } else {
            self.stalled_pages += 1;
            if self.stalled_pages >= self.settings.stall_pages {
                tracing::warn!(
                    "No new reviews for {} consecutive pages, stopping",
                    self.stalled_pages
                );
                return None;
            }
        }

        let total = self.assembler.stats().and_then(|s| s.total_reviews);
        if let Some(total) = total {
            if self.records_seen >= total as usize {
                tracing::info!(
                    "Seen {} of {} reported reviews, stopping",
                    self.records_seen,
                    total
                );
                return None;
            }
        }

        let consumed = u32::try_from(on_page).unwrap_or(u32::MAX);
        if let Some(next) = next_page {
            return self.follow(cursor, next, consumed);
        }

        match (total, self.settings.page_size) {
            (Some(_), Some(step)) => self.offset_step(cursor, step),
            _ => {
                tracing::info!("Page {} has no next page", cursor.page());
                None
            }
        }
    }

    /// Next cursor past a page that failed to parse
    fn step_over(&self, cursor: &PageCursor, page: &RawPage) -> Option<PageCursor> {
        if let Some(next) = self.parser.next_page_link(page) {
            return self.follow(cursor, next, 0);
        }
        self.settings
            .page_size
            .and_then(|step| self.offset_step(cursor, step))
    }

    fn follow(&self, cursor: &PageCursor, next: Url, consumed: u32) -> Option<PageCursor> {
        if self.visited.contains(&next) {
            tracing::warn!("Next page {} was already visited, stopping", next);
            return None;
        }
        Some(cursor.follow(next, consumed))
    }

    fn offset_step(&self, cursor: &PageCursor, step: u32) -> Option<PageCursor> {
        let next = cursor.advance_offset(step);
        if self.visited.contains(next.url()) {
            tracing::warn!("Offset page {} was already visited, stopping", next.url());
            return None;
        }
        tracing::debug!("No next link, stepping offset to {}", next.url());
        Some(next)
    }

    fn cancelled(&mut self) -> RunStatus {
        tracing::info!("Review stream dropped by consumer, stopping");
        self.last_error = Some("cancelled by consumer".to_string());
        self.transition(ControllerState::Done);
        RunStatus::Cancelled
    }

    fn transition(&mut self, next: ControllerState) {
        if !self.state.can_transition_to(next) {
            tracing::error!("Unexpected controller transition {} -> {}", self.state, next);
        }
        tracing::trace!("Controller {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Entry point for scraping one hotel's reviews
///
/// Construction validates the configuration and builds the HTTP client, so
/// every configuration problem surfaces here, before any request.
pub struct ReviewScraper {
    config: Config,
    start: Url,
    fetcher: PageFetcher,
}

impl ReviewScraper {
    /// Creates a scraper from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ReviewScraper)` - Ready to run
    /// * `Err(ConfigError)` - Invalid target URL, proxy or policy values
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        validate(&config)?;
        let start = parse_target_url(&config.target.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.target.url, e)))?;
        let fetcher = PageFetcher::new(&FetchPolicy::from_config(&config))?;

        Ok(Self {
            config,
            start,
            fetcher,
        })
    }

    /// Starts the run on the current Tokio runtime
    ///
    /// Records are produced as the stream is read; the run pauses when the
    /// stream's buffer is full.
    pub fn stream(self) -> ReviewStream {
        let Self {
            config,
            start,
            fetcher,
        } = self;

        let languages = config.target.languages;
        let language_hint = match languages.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let (emitter, rx) = Emitter::channel(config.pagination.channel_capacity);

        let controller = PaginationController::new(
            fetcher,
            ReviewParser::new(language_hint),
            Assembler::new(
                config.target.max_items,
                languages,
                config.pagination.dedup_key,
            ),
            Backoff::from_config(&config.retry),
            config.pagination,
            emitter,
        );

        let handle = tokio::spawn(controller.run(PageCursor::first(start)));
        ReviewStream::new(rx, handle)
    }

    /// Runs to completion, keeping every accepted review in memory
    pub async fn collect(self) -> Result<(Vec<ReviewItem>, RunSummary), ScrapeError> {
        self.stream().collect().await
    }
}

/// Scrapes with `config` and returns all accepted reviews with the summary
///
/// # Example
///
/// ```no_run
/// use hotel_review_scraper::config::Config;
/// use hotel_review_scraper::crawler::run_scrape;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.target.url = "https://www.booking.com/reviews/nl/hotel/canal-house.html".to_string();
/// config.target.max_items = Some(50);
///
/// let (reviews, summary) = run_scrape(config).await?;
/// println!("{} reviews ({})", reviews.len(), summary.status);
/// # Ok(())
/// # }
/// ```
pub async fn run_scrape(config: Config) -> Result<(Vec<ReviewItem>, RunSummary), ScrapeError> {
    ReviewScraper::new(config)?.collect().await
}
