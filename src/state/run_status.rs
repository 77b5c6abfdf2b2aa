use serde::Serialize;
use std::fmt;

/// Final outcome of a scrape run as reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    /// Pagination ended normally
    Completed,

    /// Some pages could not be parsed and the run stopped early; every
    /// record emitted before that is valid
    PartialFailure,

    /// A fetch failed for good; every record emitted before that is valid
    Failed,

    /// The consumer stopped reading before the run ended
    Cancelled,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::PartialFailure => "partial_failure",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
