//! Dedup & assembly
//!
//! Merges the records of successive pages into one ordered result set. This
//! is the only state carried across pages besides the cursor: the set of seen
//! review keys and the frozen hotel statistics.

use crate::config::DedupKeyPolicy;
use crate::model::{DedupKey, HotelStats, ReviewItem, ReviewRecord};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of offering one record to the assembler
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// New record, to be emitted now
    Accepted(ReviewItem),
    /// Key already emitted earlier in the run
    Duplicate,
    /// Language not in the run's filter
    Filtered,
    /// The item cap was already reached
    CapReached,
}

/// Stateful record filter for one run
#[derive(Debug)]
pub struct Assembler {
    seen: HashSet<DedupKey>,
    policy: DedupKeyPolicy,
    stats: Option<Arc<HotelStats>>,
    max_items: Option<usize>,
    languages: Vec<String>,
    emitted: usize,
    duplicate_skipped: usize,
    language_filtered: usize,
}

impl Assembler {
    /// Creates an assembler
    ///
    /// # Arguments
    ///
    /// * `max_items` - Cap on accepted records; `None` is unbounded
    /// * `languages` - Accepted language codes; empty accepts all
    /// * `policy` - Which fields make up a review's identity
    pub fn new(max_items: Option<usize>, languages: Vec<String>, policy: DedupKeyPolicy) -> Self {
        Self {
            seen: HashSet::new(),
            policy,
            stats: None,
            max_items,
            languages,
            emitted: 0,
            duplicate_skipped: 0,
            language_filtered: 0,
        }
    }

    /// Freezes the run's hotel statistics
    ///
    /// Only the first call has an effect; later pages never replace the
    /// frozen value. Bounds violations are reported here, once.
    pub fn freeze_stats(&mut self, stats: HotelStats) -> Arc<HotelStats> {
        if let Some(frozen) = &self.stats {
            return Arc::clone(frozen);
        }

        for key in stats.bounds_violations() {
            tracing::warn!("Hotel score '{}' lies outside its reported bounds", key);
        }
        tracing::debug!(
            "Froze hotel stats: {:?} total reviews, {} category scores",
            stats.total_reviews,
            stats.scores.len()
        );

        let frozen = Arc::new(stats);
        self.stats = Some(Arc::clone(&frozen));
        frozen
    }

    /// The frozen statistics, if frozen yet
    pub fn stats(&self) -> Option<&Arc<HotelStats>> {
        self.stats.as_ref()
    }

    /// Offers one record
    ///
    /// Freezes empty statistics if none were frozen before, so that every
    /// accepted item of a run shares one value.
    pub fn accept(&mut self, record: ReviewRecord) -> Admission {
        if self.is_capped() {
            return Admission::CapReached;
        }

        if !self.languages.is_empty() && !self.languages.contains(&record.language) {
            tracing::trace!(
                "Filtered review '{}' in language '{}'",
                record.title,
                record.language
            );
            self.language_filtered += 1;
            return Admission::Filtered;
        }

        let key = DedupKey::from_record(&record, self.policy);
        if !self.seen.insert(key) {
            tracing::debug!("Skipping duplicate review {} ('{}')", key, record.title);
            self.duplicate_skipped += 1;
            return Admission::Duplicate;
        }

        let hotel_stats = self.freeze_stats(HotelStats::default());
        self.emitted += 1;
        Admission::Accepted(ReviewItem {
            hotel_stats,
            review: record,
        })
    }

    /// Accepts a page's records in order, returning the admitted items
    pub fn assemble(&mut self, records: Vec<ReviewRecord>) -> Vec<ReviewItem> {
        records
            .into_iter()
            .filter_map(|record| match self.accept(record) {
                Admission::Accepted(item) => Some(item),
                _ => None,
            })
            .collect()
    }

    /// True once the cap is reached
    pub fn is_capped(&self) -> bool {
        self.max_items.map_or(false, |max| self.emitted >= max)
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn duplicate_skipped(&self) -> usize {
        self.duplicate_skipped
    }

    pub fn language_filtered(&self) -> usize {
        self.language_filtered
    }
}
