/// Page state definitions for tracking crawl progress
///
/// A page is admitted to a crawl as `Discovered`, then either short-circuits
/// (`Denied` by robots.txt, `Cached`) or goes through `Fetching` to
/// `Processed` or `Failed`.
use crate::SageError;
use std::fmt;

/// Represents the current state of a page in one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// Page was admitted to the crawl (marked visited) but not yet handled
    Discovered,

    /// Page is being fetched
    Fetching,

    // ===== Terminal Success States =====
    /// Page text was served from the cache; its links are not followed
    Cached,

    /// Page was fetched, its text extracted and cached, its links followed
    Processed,

    // ===== Terminal Skip/Error States =====
    /// robots.txt disallows the page and the policy respects it
    Denied,

    /// Fetch failed after all retries
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovered | Self::Fetching)
    }

    /// Returns true if the page contributed text to the crawl
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Cached | Self::Processed)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Checks whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Denied)
                | (Self::Discovered, Self::Cached)
                | (Self::Discovered, Self::Fetching)
                | (Self::Fetching, Self::Processed)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Moves to `next`, or reports the illegal transition
    pub fn transition(self, next: PageState) -> Result<PageState, SageError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SageError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short lowercase name, used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Fetching => "fetching",
            Self::Cached => "cached",
            Self::Processed => "processed",
            Self::Denied => "denied",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Fetching,
            Self::Cached,
            Self::Processed,
            Self::Denied,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
