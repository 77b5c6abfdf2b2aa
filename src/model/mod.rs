//! Data model for extracted reviews
//!
//! - `ReviewRecord`: one parsed review (score, texts, guest, booking, photos)
//! - `HotelStats`: hotel aggregate scores, frozen once per run
//! - `ReviewItem`: an accepted record paired with the run's shared stats
//! - `DedupKey`: identity used to drop reviews re-served on a later page

mod review;
mod stats;

use crate::config::DedupKeyPolicy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

pub use review::{Booking, Guest, GuestType, ReviewRecord};
pub use stats::{normalize_score_label, HotelStats, ScoreBounds, ScoreEntry};

/// An accepted review as delivered downstream
///
/// Serializes to the flat export shape: `hotelStats` next to the review's
/// own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(rename = "hotelStats")]
    pub hotel_stats: Arc<HotelStats>,

    #[serde(flatten)]
    pub review: ReviewRecord,
}

/// Field separator that cannot occur in whitespace-normalized page text
const KEY_SEPARATOR: &[u8] = &[0x1f];

/// Digest of the fields that identify a review across pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey([u8; 32]);

impl DedupKey {
    pub fn from_record(record: &ReviewRecord, policy: DedupKeyPolicy) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(record.guest.name.as_bytes());
        hasher.update(KEY_SEPARATOR);
        match record.review_date {
            Some(ts) => hasher.update(ts.to_be_bytes()),
            None => hasher.update(b"-"),
        }
        hasher.update(KEY_SEPARATOR);
        hasher.update(record.title.as_bytes());

        if policy == DedupKeyPolicy::NameDateTitleContent {
            hasher.update(KEY_SEPARATOR);
            hasher.update(record.positive_content.as_bytes());
            hasher.update(KEY_SEPARATOR);
            hasher.update(record.negative_content.as_bytes());
        }

        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to correlate log lines
        f.write_str(&hex::encode(&self.0[..8]))
    }
}
