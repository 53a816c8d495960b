/// Item outcome definitions for tracking crawl progress
///
/// A player name or match id is queued while it sits in a frontier pending
/// queue and in flight while its cycle runs. Each cycle ends in one of the
/// outcomes below.
use std::fmt;

/// Terminal outcome of one player or match cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Item was fetched and persisted
    Stored,

    /// Item was already durable in the store; nothing was fetched
    SkippedDuplicate,

    /// Item failed transiently, was retried once, and failed again
    FailedTransientRetry,

    /// Item is missing upstream, rejected, or malformed
    FailedPermanent,
}

impl ItemState {
    /// Returns true if the cycle persisted a new document
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stored)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::SkippedDuplicate => "skipped_duplicate",
            Self::FailedTransientRetry => "failed_transient_retry",
            Self::FailedPermanent => "failed_permanent",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
