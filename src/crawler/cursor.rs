//! Pagination cursor
//!
//! A `PageCursor` names the next page to request. Only the pagination
//! controller creates or advances cursors; the fetcher reads the URL out of
//! it and the parser never sees it.

use crate::url::with_query_param;
use url::Url;

/// Query parameter carrying the record offset on listing pages
pub const OFFSET_PARAM: &str = "offset";

/// Opaque position in the review listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
    offset: u32,
    url: Url,
}

impl PageCursor {
    /// Cursor for the first page of the listing
    ///
    /// An `offset` already present on the target URL is honored, so a run can
    /// start part-way into the listing.
    pub fn first(url: Url) -> Self {
        let offset = url
            .query_pairs()
            .find(|(key, _)| key == OFFSET_PARAM)
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(0);

        Self {
            page: 1,
            offset,
            url,
        }
    }

    /// 1-based number of the page this cursor points at
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Moves to a site-supplied next-page URL
    pub(crate) fn follow(&self, next: Url, consumed: u32) -> Self {
        Self {
            page: self.page.saturating_add(1),
            offset: self.offset.saturating_add(consumed),
            url: next,
        }
    }

    /// Moves forward by `step` records on the current URL's offset parameter
    pub(crate) fn advance_offset(&self, step: u32) -> Self {
        let offset = self.offset.saturating_add(step);
        Self {
            page: self.page.saturating_add(1),
            offset,
            url: with_query_param(&self.url, OFFSET_PARAM, &offset.to_string()),
        }
    }
}
