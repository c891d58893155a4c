//! Incremental listing pagination for one feed.
//!
//! Further listing pages are discovered by observing pagination network
//! events after a scroll interaction, never by guessing URL templates.
//! Three conditions end the loop, whichever fires first: the target count
//! is reached, no new pagination event arrives within the settle window
//! (end of content or throttling), or the round cap is hit.

use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use super::error::HarvestError;
use super::SCROLL_TO_BOTTOM;
use crate::browser::{Session, SessionError};
use crate::extract::extract_posts;
use crate::models::{Feed, PostSummary};

/// Drives incremental listing retrieval for one feed over one session.
pub struct FeedPaginator<'a> {
    session: &'a mut dyn Session,
    /// Bounded wait for a pagination event after each scroll.
    settle: Duration,
    /// Hard cap on pagination rounds, so a feed that keeps emitting
    /// events without new candidates cannot spin forever.
    max_rounds: usize,
}

impl<'a> FeedPaginator<'a> {
    pub fn new(session: &'a mut dyn Session, settle: Duration, max_rounds: usize) -> Self {
        Self {
            session,
            settle,
            max_rounds,
        }
    }

    /// Accumulate new candidates for `feed` until `target` is met or no
    /// further data is observed. Ids in `known` never appear in the
    /// output; output order is discovery order.
    pub async fn paginate(
        &mut self,
        feed: &Feed,
        known: &HashSet<String>,
        target: usize,
    ) -> Result<Vec<PostSummary>, HarvestError> {
        let pattern = Regex::new(&feed.pagination_pattern())
            .map_err(|e| HarvestError::Extraction(format!("bad pagination pattern: {}", e)))?;

        let listing_url = feed.listing_url();

        // A slow initial load still renders partial content worth
        // extracting; only non-timeout failures abort the feed.
        match self.session.navigate(&listing_url).await {
            Ok(()) => {}
            Err(SessionError::Timeout { url, .. }) => {
                warn!(feed = %feed.name, url = %url, "listing navigation timed out, extracting rendered state");
            }
            Err(e) => return Err(e.into()),
        }

        // Ids seen this call: the caller's known set plus everything
        // already accumulated, so repeated entries across pages collapse.
        let mut seen = known.clone();
        let html = self.session.rendered_html().await?;
        let mut out = extract_posts(&html, &feed.name, &seen);
        seen.extend(out.iter().map(|p| p.id.clone()));

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(listing_url);

        let mut rounds = 0;
        while out.len() < target && rounds < self.max_rounds {
            rounds += 1;

            if let Err(e) = self.session.evaluate(SCROLL_TO_BOTTOM).await {
                debug!(feed = %feed.name, error = %e, "scroll interaction failed");
            }

            let event_url = match self
                .session
                .next_response_matching(&pattern, self.settle)
                .await?
            {
                Some(url) => url,
                None => {
                    debug!(feed = %feed.name, "no pagination event within settle window");
                    break;
                }
            };

            // Repeated or racing events for a page we already pulled
            if !visited.insert(event_url.clone()) {
                debug!(feed = %feed.name, url = %event_url, "ignoring repeated pagination event");
                continue;
            }

            let batch = self.fetch_batch(&event_url, feed, &seen).await;
            seen.extend(batch.iter().map(|p| p.id.clone()));
            out.extend(batch);
        }

        Ok(out)
    }

    /// Render one pagination page and extract its candidates. Any failure
    /// yields an empty batch for that page, never a fatal error for the
    /// feed.
    async fn fetch_batch(
        &mut self,
        url: &str,
        feed: &Feed,
        seen: &HashSet<String>,
    ) -> Vec<PostSummary> {
        match self.session.navigate(url).await {
            Ok(()) => {}
            Err(e) => {
                warn!(feed = %feed.name, url = %url, error = %e, "pagination page navigation failed");
                return Vec::new();
            }
        }

        match self.session.rendered_html().await {
            Ok(html) => extract_posts(&html, &feed.name, seen),
            Err(e) => {
                warn!(feed = %feed.name, url = %url, error = %e, "pagination page render failed");
                Vec::new()
            }
        }
    }
}
