//! Named content feeds.

use serde::{Deserialize, Serialize};

/// Site base all relative permalinks resolve against.
pub const SITE_BASE: &str = "https://www.reddit.com";

/// Default pagination endpoint pattern. Scrolling a listing triggers a
/// partial-feed request against this service path; observing one of those
/// responses is how further listing pages are discovered.
const DEFAULT_PAGINATION_PATTERN: &str = r"/svc/shreddit/feeds/";

/// A named content stream queried for new items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    /// Board name, e.g. `linux`.
    pub name: String,
    /// Listing URL override; derived from the name when absent.
    pub listing_url: Option<String>,
    /// Pagination endpoint pattern (regex) override.
    pub pagination_pattern: Option<String>,
}

impl Feed {
    /// Create a feed from its board name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            listing_url: None,
            pagination_pattern: None,
        }
    }

    /// Override the pagination endpoint pattern.
    pub fn with_pagination_pattern(mut self, pattern: &str) -> Self {
        self.pagination_pattern = Some(pattern.to_string());
        self
    }

    /// URL of the newest-first compact listing view.
    pub fn listing_url(&self) -> String {
        match self.listing_url {
            Some(ref url) => url.clone(),
            None => format!("{}/r/{}/new/?feedViewType=compactView", SITE_BASE, self.name),
        }
    }

    /// Pattern a network response URL must match to count as a pagination
    /// event for this feed.
    pub fn pagination_pattern(&self) -> String {
        self.pagination_pattern
            .clone()
            .unwrap_or_else(|| DEFAULT_PAGINATION_PATTERN.to_string())
    }

    /// Resolve a possibly site-relative permalink into an absolute URL.
    pub fn resolve_url(path: &str) -> String {
        match url::Url::parse(path) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => url::Url::parse(SITE_BASE)
                .and_then(|base| base.join(path))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{}{}", SITE_BASE, path)),
        }
    }
}
