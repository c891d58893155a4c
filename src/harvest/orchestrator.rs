//! Cycle orchestration across feeds.
//!
//! One cycle processes every configured feed once. Feeds run as
//! concurrent tasks admitted by a bounded semaphore; items within a feed
//! are processed strictly sequentially over that feed's session. A feed
//! failure is contained to its task and the cycle still completes the
//! remaining feeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::dedup::DedupIndex;
use super::error::{report, HarvestError, Stage};
use super::fetcher::DetailFetcher;
use super::paginator::FeedPaginator;
use crate::browser::SessionProvider;
use crate::config::HarvestConfig;
use crate::models::{DetailOutcome, Feed, Post};
use crate::repository::{DbContext, InsertOutcome};

/// Aggregate outcome of one harvest cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Feeds whose pipeline ran to completion.
    pub feeds_ok: usize,
    /// Feeds aborted by a feed-level failure.
    pub feeds_failed: usize,
    /// Posts persisted this cycle.
    pub inserted: usize,
    /// Candidates whose detail page yielded no record.
    pub not_found: usize,
    /// Candidates already persisted by the time their insert ran.
    pub conflicts: usize,
    /// Items dropped by a non-fatal item-level failure.
    pub item_failures: usize,
    /// Candidates skipped by the pre-insert known-id check.
    pub skipped: usize,
}

impl CycleSummary {
    fn absorb(&mut self, other: &CycleSummary) {
        self.feeds_ok += other.feeds_ok;
        self.feeds_failed += other.feeds_failed;
        self.inserted += other.inserted;
        self.not_found += other.not_found;
        self.conflicts += other.conflicts;
        self.item_failures += other.item_failures;
        self.skipped += other.skipped;
    }
}

/// Runs harvest cycles over a session provider and a database context.
pub struct Orchestrator {
    ctx: DbContext,
    provider: Arc<dyn SessionProvider>,
    config: HarvestConfig,
}

impl Orchestrator {
    pub fn new(ctx: DbContext, provider: Arc<dyn SessionProvider>, config: HarvestConfig) -> Self {
        Self {
            ctx,
            provider,
            config,
        }
    }

    /// Run one cycle over `feeds`, returning aggregate counts.
    pub async fn run_cycle(&self, feeds: Vec<Feed>) -> CycleSummary {
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut handles = Vec::with_capacity(feeds.len());

        for feed in feeds {
            let semaphore = Arc::clone(&semaphore);
            let ctx = self.ctx.clone();
            let provider = Arc::clone(&self.provider);
            let config = self.config.clone();

            handles.push(tokio::spawn(async move {
                // Closed only when the runtime shuts down
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return CycleSummary {
                        feeds_failed: 1,
                        ..Default::default()
                    };
                };
                match Self::harvest_feed(&ctx, provider.as_ref(), &config, &feed).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        report(&feed.name, None, Stage::Listing, &e);
                        CycleSummary {
                            feeds_failed: 1,
                            ..Default::default()
                        }
                    }
                }
            }));
        }

        let mut total = CycleSummary::default();
        for handle in handles {
            match handle.await {
                Ok(summary) => total.absorb(&summary),
                Err(e) => {
                    warn!(error = %e, "feed task panicked");
                    total.feeds_failed += 1;
                }
            }
        }

        info!(
            feeds_ok = total.feeds_ok,
            feeds_failed = total.feeds_failed,
            inserted = total.inserted,
            not_found = total.not_found,
            conflicts = total.conflicts,
            item_failures = total.item_failures,
            "cycle complete"
        );
        total
    }

    /// Run the full pipeline for one feed: paginate, then enrich and
    /// persist each candidate in discovery order.
    async fn harvest_feed(
        ctx: &DbContext,
        provider: &dyn SessionProvider,
        config: &HarvestConfig,
        feed: &Feed,
    ) -> Result<CycleSummary, HarvestError> {
        let repo = ctx.posts();
        let mut index = DedupIndex::load(&repo, &feed.name).await?;

        let mut session = provider.open_session().await?;

        let candidates = {
            let mut paginator = FeedPaginator::new(
                session.as_mut(),
                Duration::from_millis(config.listing_settle_ms),
                config.max_pagination_rounds,
            );
            match paginator
                .paginate(feed, index.ids(), config.target_count)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    session.close().await;
                    return Err(e);
                }
            }
        };

        info!(
            feed = %feed.name,
            candidates = candidates.len(),
            known = index.len(),
            "listing phase complete"
        );

        let mut summary = CycleSummary {
            feeds_ok: 1,
            ..Default::default()
        };

        for candidate in candidates {
            // The store may have gained this id since the snapshot (a
            // concurrent run, or a feed that repeats entries)
            if index.contains(&candidate.id) {
                summary.skipped += 1;
                continue;
            }

            let outcome = {
                let mut fetcher = DetailFetcher::new(
                    session.as_mut(),
                    Duration::from_millis(config.detail_settle_ms),
                );
                fetcher.fetch(&candidate).await
            };

            let detail = match outcome {
                Ok(DetailOutcome::Found(detail)) => detail,
                Ok(DetailOutcome::NotFound) => {
                    summary.not_found += 1;
                    continue;
                }
                Err(e) => {
                    report(&feed.name, Some(&candidate.id), Stage::Detail, &e);
                    summary.item_failures += 1;
                    continue;
                }
            };

            let post = Post::from_parts(candidate, detail);
            match repo.insert(&post).await {
                Ok(InsertOutcome::Inserted) => {
                    index.mark_persisted(&post.id);
                    summary.inserted += 1;
                }
                Ok(InsertOutcome::Conflict) => {
                    report(
                        &feed.name,
                        Some(&post.id),
                        Stage::Persist,
                        &HarvestError::PersistenceConflict {
                            id: post.id.clone(),
                        },
                    );
                    index.mark_persisted(&post.id);
                    summary.conflicts += 1;
                }
                Err(e) => {
                    report(&feed.name, Some(&post.id), Stage::Persist, &e.into());
                    summary.item_failures += 1;
                }
            }
        }

        session.close().await;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::testing::{ScriptedProvider, ScriptedSession};
    use tempfile::tempdir;

    fn listing_html(feed: &str, ids: &[&str]) -> String {
        let mut html = String::from("<html><body>");
        for id in ids {
            html.push_str(&format!(
                r#"<shreddit-post id="{id}" post-title="Post {id}" author="a" author-id="t2"
                    post-type="text" permalink="/r/{feed}/comments/{id}/" score="1"></shreddit-post>"#
            ));
        }
        html.push_str("</body></html>");
        html
    }

    fn detail_html(id: &str, body: &str) -> String {
        format!(
            r#"<html><body>
              <shreddit-post id="{id}" post-type="text">
                <div class="text-neutral-content"><p>{body}</p></div>
              </shreddit-post>
            </body></html>"#
        )
    }

    fn detail_url(feed: &str, id: &str) -> String {
        format!("https://www.reddit.com/r/{feed}/comments/{id}/")
    }

    /// A site with one feed "linux" carrying two posts.
    fn linux_site() -> ScriptedSession {
        let mut session = ScriptedSession::new();
        session.add_page(
            &Feed::new("linux").listing_url(),
            &listing_html("linux", &["t3_a", "t3_b"]),
        );
        session.add_page(&detail_url("linux", "t3_a"), &detail_html("t3_a", "first"));
        session.add_page(&detail_url("linux", "t3_b"), &detail_html("t3_b", "second"));
        session
    }

    async fn setup() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    fn config() -> HarvestConfig {
        HarvestConfig {
            target_count: 10,
            workers: 3,
            listing_settle_ms: 0,
            detail_settle_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cycle_persists_new_candidates() {
        let (ctx, _dir) = setup().await;
        let provider = Arc::new(ScriptedProvider::new(linux_site()));
        let orchestrator = Orchestrator::new(ctx.clone(), provider, config());

        let summary = orchestrator.run_cycle(vec![Feed::new("linux")]).await;

        assert_eq!(summary.feeds_ok, 1);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.feeds_failed, 0);

        let repo = ctx.posts();
        assert_eq!(repo.count_for_feed("linux").await.unwrap(), 2);
        let post = repo.get("t3_a").await.unwrap().unwrap();
        assert_eq!(post.content, "first");
    }

    #[tokio::test]
    async fn test_second_cycle_inserts_nothing() {
        let (ctx, _dir) = setup().await;
        let provider = Arc::new(ScriptedProvider::new(linux_site()));
        let orchestrator = Orchestrator::new(ctx.clone(), provider, config());

        let first = orchestrator.run_cycle(vec![Feed::new("linux")]).await;
        assert_eq!(first.inserted, 2);

        let second = orchestrator.run_cycle(vec![Feed::new("linux")]).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.feeds_ok, 1);

        assert_eq!(ctx.posts().count_for_feed("linux").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_feed_failure_is_isolated() {
        let (ctx, _dir) = setup().await;

        let mut site = linux_site();
        site.add_page(
            &Feed::new("rust").listing_url(),
            &listing_html("rust", &["t3_r"]),
        );
        site.add_page(&detail_url("rust", "t3_r"), &detail_html("t3_r", "rusty"));
        // The third feed's listing breaks hard
        site.break_navigation(&Feed::new("broken").listing_url());

        let provider = Arc::new(ScriptedProvider::new(site));
        let orchestrator = Orchestrator::new(ctx.clone(), provider, config());

        let summary = orchestrator
            .run_cycle(vec![
                Feed::new("linux"),
                Feed::new("rust"),
                Feed::new("broken"),
            ])
            .await;

        assert_eq!(summary.feeds_ok, 2);
        assert_eq!(summary.feeds_failed, 1);
        assert_eq!(summary.inserted, 3);

        let repo = ctx.posts();
        assert_eq!(repo.count_for_feed("linux").await.unwrap(), 2);
        assert_eq!(repo.count_for_feed("rust").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_detail_counts_not_found() {
        let (ctx, _dir) = setup().await;

        let mut site = ScriptedSession::new();
        site.add_page(
            &Feed::new("linux").listing_url(),
            &listing_html("linux", &["t3_a", "t3_gone"]),
        );
        site.add_page(&detail_url("linux", "t3_a"), &detail_html("t3_a", "first"));
        // t3_gone renders an unrecognizable page

        let provider = Arc::new(ScriptedProvider::new(site));
        let orchestrator = Orchestrator::new(ctx.clone(), provider, config());

        let summary = orchestrator.run_cycle(vec![Feed::new("linux")]).await;

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.feeds_ok, 1);
        assert_eq!(ctx.posts().count_for_feed("linux").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_session_open_failure_fails_the_feed() {
        let (ctx, _dir) = setup().await;
        let provider = Arc::new(ScriptedProvider::failing());
        let orchestrator = Orchestrator::new(ctx, provider, config());

        let summary = orchestrator.run_cycle(vec![Feed::new("linux")]).await;

        assert_eq!(summary.feeds_failed, 1);
        assert_eq!(summary.feeds_ok, 0);
    }
}
