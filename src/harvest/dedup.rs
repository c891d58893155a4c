//! Run-scoped mirror of known post ids.
//!
//! The persistence store is the single source of truth; this index is a
//! per-feed, per-run shadow used purely for duplicate suppression. It is
//! append-only for the run's duration and never evicts.

use std::collections::HashSet;

use crate::repository::{DieselError, PostRepository};

/// In-memory set of known post ids for one feed.
#[derive(Debug, Default)]
pub struct DedupIndex {
    ids: HashSet<String>,
}

impl DedupIndex {
    /// Load a full snapshot of known ids for one feed. Called once per
    /// feed at the start of its processing within a run.
    pub async fn load(repo: &PostRepository, feed: &str) -> Result<Self, DieselError> {
        Ok(Self {
            ids: repo.ids_for_feed(feed).await?,
        })
    }

    /// Build an index from explicit ids.
    pub fn from_ids(ids: HashSet<String>) -> Self {
        Self { ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record an id as known. Called only after a confirmed successful
    /// persist (or after observing that the store already holds it).
    pub fn mark_persisted(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    /// The known-id snapshot, for the paginator's filtering.
    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_contains() {
        let mut index = DedupIndex::default();
        assert!(!index.contains("t3_a"));

        index.mark_persisted("t3_a");
        assert!(index.contains("t3_a"));
        assert_eq!(index.len(), 1);

        // Re-marking is idempotent
        index.mark_persisted("t3_a");
        assert_eq!(index.len(), 1);
    }
}
