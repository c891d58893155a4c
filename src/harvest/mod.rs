//! The harvest engine.
//!
//! [`FeedPaginator`] discovers new candidates per feed by observing
//! pagination network events, [`DetailFetcher`] enriches one candidate at
//! a time, and [`Orchestrator`] runs feed pipelines concurrently under a
//! bounded admission pool, isolating failures at item and feed
//! granularity.

pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod paginator;

#[cfg(test)]
pub(crate) mod testing;

pub use dedup::DedupIndex;
pub use error::{report, HarvestError, Stage};
pub use fetcher::DetailFetcher;
pub use orchestrator::{CycleSummary, Orchestrator};
pub use paginator::FeedPaginator;

/// Scroll interaction that triggers the next pagination request.
pub(crate) const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
