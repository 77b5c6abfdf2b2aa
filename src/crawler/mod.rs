//! Review extraction engine
//!
//! This module contains the core scraping pipeline, including:
//! - HTTP fetching with rate limiting and block detection
//! - Review page parsing over several markup dialects
//! - Pagination with retry, stall and failure guards
//! - De-duplication, item cap and stats attachment
//! - Streaming of accepted reviews to the caller

mod assembly;
mod backoff;
mod controller;
mod cursor;
mod emitter;
mod fetcher;
mod parser;

pub use assembly::{Admission, Assembler};
pub use backoff::Backoff;
pub use controller::{run_scrape, PaginationController, ReviewScraper};
pub use cursor::{PageCursor, OFFSET_PARAM};
pub use emitter::{Disconnected, Emitter, ReviewStream};
pub use fetcher::{
    build_http_client, is_challenge_page, FetchError, FetchErrorKind, FetchPolicy, PageFetcher,
    RawPage,
};
pub use parser::{
    extract_hotel_stats, find_next_page, Field, MarkupDialect, ParseError, ParsedPage,
    ReviewParser,
};
