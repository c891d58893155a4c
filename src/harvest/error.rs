//! Harvest failure taxonomy and centralized reporting.
//!
//! Every failure below the cycle boundary is non-fatal: it is logged with
//! enough context to find the feed/item/stage it belongs to, and the
//! enclosing loop moves on.

use tracing::warn;

use crate::browser::SessionError;
use crate::repository::DieselError;

/// Errors arising while harvesting one feed or one item.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// No response within the bounded wait window. Interpreted as
    /// end-of-pagination or skip-this-candidate, never escalated.
    #[error("navigation timed out: {url}")]
    NavigationTimeout { url: String },

    /// Expected structure absent or malformed.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Duplicate id at insert time. Logged and skipped, not corruption.
    #[error("duplicate id at insert: {id}")]
    PersistenceConflict { id: String },

    #[error("database error: {0}")]
    Database(#[from] DieselError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SessionError> for HarvestError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Timeout { url, .. } => HarvestError::NavigationTimeout { url },
            SessionError::Other(e) => HarvestError::Other(e),
        }
    }
}

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Listing,
    Detail,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Detail => "detail",
            Self::Persist => "persist",
        }
    }
}

/// Emit one structured log line for a failure, keyed by feed, item, and
/// stage. Used by both feed-level and item-level failure paths.
pub fn report(feed: &str, item: Option<&str>, stage: Stage, err: &HarvestError) {
    match item {
        Some(item) => warn!(
            feed = feed,
            item = item,
            stage = stage.as_str(),
            error = %err,
            "harvest step failed"
        ),
        None => warn!(
            feed = feed,
            stage = stage.as_str(),
            error = %err,
            "feed aborted"
        ),
    }
}
