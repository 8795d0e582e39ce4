/// Warm state definitions for tracking a single URL through a run
use std::fmt;

/// Represents where a URL is in its warming lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarmState {
    /// Resolved from a sitemap, not yet requested
    Pending,

    /// Request (including retries) is outstanding
    InFlight,

    /// Response received and classified
    WarmedOk,

    /// Request failed after retries were exhausted
    WarmedError,
}

impl WarmState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WarmedOk | Self::WarmedError)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: WarmState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::WarmedOk)
                | (Self::InFlight, Self::WarmedError)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::WarmedOk => "warmed_ok",
            Self::WarmedError => "warmed_error",
        }
    }
}

impl fmt::Display for WarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
