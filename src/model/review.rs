use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One guest review as extracted from a listing page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Overall score on the site's 0-10 scale
    pub score: Option<f64>,

    /// UNIX timestamp (seconds) of the review
    pub review_date: Option<i64>,

    pub title: String,
    pub positive_content: String,
    pub negative_content: String,

    /// Lowercase primary ISO-639 subtag, empty when unknown
    pub language: String,

    pub guest: Guest,
    pub booking: Booking,

    /// Absolute photo URLs in page order
    pub photos: Vec<String>,
}

impl ReviewRecord {
    /// A record with none of score, title and review date carries nothing
    /// that identifies it and is dropped by the parser
    pub fn is_blank(&self) -> bool {
        self.score.is_none() && self.title.is_empty() && self.review_date.is_none()
    }
}

/// Reviewer metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    pub country: String,
    #[serde(rename = "type")]
    pub guest_type: GuestType,
}

/// Traveller category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestType {
    Solo,
    Couple,
    Family,
    Group,
    Business,
    #[default]
    Unknown,
}

/// Label fragments (lowercase) recognized per traveller category, across the
/// locales the listing is served in
const GUEST_TYPE_LABELS: &[(&str, GuestType)] = &[
    ("solo", GuestType::Solo),
    ("alleinreisend", GuestType::Solo),
    ("voyageur individuel", GuestType::Solo),
    ("alleenreizend", GuestType::Solo),
    ("viajero solo", GuestType::Solo),
    ("couple", GuestType::Couple),
    ("paar", GuestType::Couple),
    ("stel", GuestType::Couple),
    ("pareja", GuestType::Couple),
    ("coppia", GuestType::Couple),
    ("famil", GuestType::Family),
    ("gezin", GuestType::Family),
    ("group", GuestType::Group),
    ("gruppe", GuestType::Group),
    ("groupe", GuestType::Group),
    ("groep", GuestType::Group),
    ("grupo", GuestType::Group),
    ("gruppo", GuestType::Group),
    ("business", GuestType::Business),
    ("geschäft", GuestType::Business),
    ("affaires", GuestType::Business),
    ("zakelijk", GuestType::Business),
    ("negocios", GuestType::Business),
    ("lavoro", GuestType::Business),
];

impl GuestType {
    /// Maps a free-text traveller label ("Family with young children",
    /// "Solo traveller", ...) to a category
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        GUEST_TYPE_LABELS
            .iter()
            .find(|(needle, _)| label.contains(needle))
            .map(|(_, guest_type)| *guest_type)
            .unwrap_or(GuestType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Couple => "couple",
            Self::Family => "family",
            Self::Group => "group",
            Self::Business => "business",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stay metadata attached to a review
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub room_type: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub nights: Option<u32>,
    pub customer_type: String,
}

impl Booking {
    /// Enforces `check_out >= check_in` and aligns `nights` with the date span
    ///
    /// Reversed dates cannot be trusted and are both cleared. When both dates
    /// are present the span wins over a parsed night count.
    pub fn reconcile(&mut self) {
        let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) else {
            return;
        };

        if check_out < check_in {
            tracing::warn!(
                "Discarding reversed stay dates: check-in {} after check-out {}",
                check_in,
                check_out
            );
            self.check_in = None;
            self.check_out = None;
            return;
        }

        let span = (check_out - check_in).num_days();
        let Ok(span) = u32::try_from(span) else {
            return;
        };

        if let Some(parsed) = self.nights {
            if parsed != span {
                tracing::debug!(
                    "Night count {} disagrees with stay span {}; using the span",
                    parsed,
                    span
                );
            }
        }
        self.nights = Some(span);
    }
}
