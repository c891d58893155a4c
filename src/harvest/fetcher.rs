//! Detail enrichment for one candidate at a time.

use std::time::Duration;

use tracing::{debug, warn};

use super::error::HarvestError;
use super::SCROLL_TO_BOTTOM;
use crate::browser::{Session, SessionError};
use crate::extract::extract_detail;
use crate::models::{DetailOutcome, Feed, PostSummary};

/// Fetches and extracts detail pages over a feed task's session.
pub struct DetailFetcher<'a> {
    session: &'a mut dyn Session,
    /// Settle delay after the scroll interaction, giving lazy media and
    /// comments time to render.
    settle: Duration,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(session: &'a mut dyn Session, settle: Duration) -> Self {
        Self { session, settle }
    }

    /// Load one candidate's detail page and extract its record.
    ///
    /// A navigation timeout or an unrecognizable page yields `NotFound`,
    /// which skips the item; only session-level failures propagate.
    pub async fn fetch(
        &mut self,
        candidate: &PostSummary,
    ) -> Result<DetailOutcome, HarvestError> {
        let url = Feed::resolve_url(&candidate.url);

        match self.session.navigate(&url).await {
            Ok(()) => {}
            Err(SessionError::Timeout { .. }) => {
                warn!(item = %candidate.id, url = %url, "detail navigation timed out");
                return Ok(DetailOutcome::NotFound);
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.session.evaluate(SCROLL_TO_BOTTOM).await {
            debug!(item = %candidate.id, error = %e, "detail scroll failed");
        }
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let html = self.session.rendered_html().await?;
        match extract_detail(&html, candidate.kind) {
            Some(detail) => Ok(DetailOutcome::Found(detail)),
            None => {
                debug!(item = %candidate.id, url = %url, "no detail structure on page");
                Ok(DetailOutcome::NotFound)
            }
        }
    }
}
