use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hotel-level aggregate rating data, shared by every review of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelStats {
    /// Review count reported by the site, if any
    pub total_reviews: Option<u32>,

    /// Category scores keyed by normalized label (e.g. `hotel_staff`)
    pub scores: BTreeMap<String, ScoreEntry>,
}

impl HotelStats {
    /// True when the page carried neither a review count nor category scores
    pub fn is_empty(&self) -> bool {
        self.total_reviews.is_none() && self.scores.is_empty()
    }

    /// Keys whose score falls outside its reported confidence bounds
    pub fn bounds_violations(&self) -> Vec<&str> {
        self.scores
            .iter()
            .filter(|(_, entry)| !entry.within_bounds())
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

/// One category score
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: f64,

    /// The label as displayed by the site
    pub translation: String,

    pub bounds: ScoreBounds,
}

impl ScoreEntry {
    /// Checks `lower <= score <= higher` for whichever bounds are present
    pub fn within_bounds(&self) -> bool {
        let above_lower = self.bounds.lower.map_or(true, |lower| lower <= self.score);
        let below_higher = self.bounds.higher.map_or(true, |higher| self.score <= higher);
        above_lower && below_higher
    }
}

/// Site-reported confidence interval of a category score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub lower: Option<f64>,
    pub higher: Option<f64>,
}

/// Turns a displayed category label into a stats key
///
/// ```
/// use hotel_review_scraper::model::normalize_score_label;
///
/// assert_eq!(normalize_score_label(" Hotel staff "), "hotel_staff");
/// assert_eq!(normalize_score_label("Value for money"), "value_for_money");
/// ```
pub fn normalize_score_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .replace('-', "_")
}
