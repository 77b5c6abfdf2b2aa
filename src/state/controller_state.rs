/// Pagination controller state definitions
///
/// The controller walks these states once per page until it reaches a
/// terminal state.
use std::fmt;

/// Represents where the pagination controller is in its page loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Nothing has been requested yet
    Init,

    /// A page request (or a retry of it) is in flight
    Fetching,

    /// A fetched page is being turned into records
    Parsing,

    /// Records were handed to assembly; deciding whether to continue
    Advancing,

    // ===== Terminal States =====
    /// Pagination ended normally (cap, last page, stall, or consumer gone)
    Done,

    /// Pagination ended on an exhausted retry budget, a non-retriable fetch
    /// error, or too many unparseable pages in a row
    Failed,
}

impl ControllerState {
    /// Returns true if this is a terminal state (the loop has ended)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the transition `self -> next` is part of the machine
    pub fn can_transition_to(&self, next: ControllerState) -> bool {
        use ControllerState::*;

        matches!(
            (self, next),
            (Init, Fetching)
                | (Fetching, Parsing)
                | (Fetching, Fetching)
                | (Fetching, Failed)
                | (Fetching, Done)
                | (Parsing, Advancing)
                | (Parsing, Failed)
                | (Advancing, Fetching)
                | (Advancing, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Advancing => "advancing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
