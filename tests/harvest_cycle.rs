//! End-to-end harvest cycle tests over a scripted browser and a real
//! SQLite database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tempfile::tempdir;

use redharvest::browser::{Session, SessionError, SessionProvider};
use redharvest::config::HarvestConfig;
use redharvest::harvest::Orchestrator;
use redharvest::models::Feed;
use redharvest::repository::DbContext;

/// A scripted site: URL to rendered markup, plus a queue of pagination
/// event URLs shared by every session it opens.
#[derive(Clone, Default)]
struct FakeSite {
    pages: Arc<Mutex<HashMap<String, String>>>,
    events: Arc<Mutex<Vec<String>>>,
    broken: Arc<Mutex<Vec<String>>>,
}

impl FakeSite {
    fn new() -> Self {
        Self::default()
    }

    fn add_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    fn push_event(&self, url: &str) {
        self.events.lock().unwrap().push(url.to_string());
    }

    fn break_url(&self, url: &str) {
        self.broken.lock().unwrap().push(url.to_string());
    }
}

struct FakeSession {
    site: FakeSite,
    current: Option<String>,
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        if self.site.broken.lock().unwrap().iter().any(|u| u == url) {
            return Err(SessionError::Other(anyhow::anyhow!("broken url: {url}")));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn rendered_html(&mut self) -> Result<String, SessionError> {
        let pages = self.site.pages.lock().unwrap();
        Ok(self
            .current
            .as_ref()
            .and_then(|url| pages.get(url))
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn next_response_matching(
        &mut self,
        pattern: &Regex,
        _window: Duration,
    ) -> Result<Option<String>, SessionError> {
        let mut events = self.site.events.lock().unwrap();
        if events.is_empty() {
            return Ok(None);
        }
        let url = events.remove(0);
        Ok(Some(url).filter(|u| pattern.is_match(u)))
    }

    async fn close(&mut self) {}
}

#[async_trait]
impl SessionProvider for FakeSite {
    async fn open_session(&self) -> Result<Box<dyn Session>, SessionError> {
        Ok(Box::new(FakeSession {
            site: self.clone(),
            current: None,
        }))
    }
}

fn listing_html(feed: &str, ids: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for id in ids {
        html.push_str(&format!(
            r#"<shreddit-post id="{id}" post-title="Post {id}" author="writer"
                author-id="t2_w" post-type="text"
                permalink="/r/{feed}/comments/{id}/" score="5"></shreddit-post>"#
        ));
    }
    html.push_str("</body></html>");
    html
}

fn detail_html(id: &str, body: &str, comment: Option<&str>) -> String {
    let comments = match comment {
        Some(text) => format!(
            r#"<shreddit-comment thingid="{id}_c1" postid="{id}" author="reader"
                parentid="" content-type="text"><div class="py-0"><p>{text}</p></div>
              </shreddit-comment>"#
        ),
        None => String::new(),
    };
    format!(
        r#"<html><body>
          <shreddit-post id="{id}" post-type="text">
            <div class="text-neutral-content"><p>{body}</p></div>
          </shreddit-post>
          {comments}
        </body></html>"#
    )
}

fn detail_url(feed: &str, id: &str) -> String {
    format!("https://www.reddit.com/r/{feed}/comments/{id}/")
}

fn config() -> HarvestConfig {
    HarvestConfig {
        target_count: 10,
        workers: 2,
        listing_settle_ms: 0,
        detail_settle_ms: 0,
        ..Default::default()
    }
}

async fn setup_db() -> (DbContext, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let ctx = DbContext::new(&dir.path().join("harvest.db"));
    ctx.init_schema().await.unwrap();
    (ctx, dir)
}

#[tokio::test]
async fn full_cycle_persists_posts_and_comments() {
    let (ctx, _dir) = setup_db().await;

    let site = FakeSite::new();
    site.add_page(
        &Feed::new("linux").listing_url(),
        &listing_html("linux", &["t3_a", "t3_b"]),
    );
    site.add_page(
        &detail_url("linux", "t3_a"),
        &detail_html("t3_a", "first body", Some("nice post")),
    );
    site.add_page(
        &detail_url("linux", "t3_b"),
        &detail_html("t3_b", "second body", None),
    );

    let orchestrator = Orchestrator::new(ctx.clone(), Arc::new(site), config());
    let summary = orchestrator.run_cycle(vec![Feed::new("linux")]).await;

    assert_eq!(summary.feeds_ok, 1);
    assert_eq!(summary.inserted, 2);

    let repo = ctx.posts();
    let post = repo.get("t3_a").await.unwrap().unwrap();
    assert_eq!(post.content, "first body");
    assert_eq!(post.comments.len(), 1);
    assert_eq!(post.comments[0].content, "nice post");
    assert_eq!(repo.comment_count_for_feed("linux").await.unwrap(), 1);
}

#[tokio::test]
async fn pagination_event_extends_the_cycle() {
    let (ctx, _dir) = setup_db().await;

    let site = FakeSite::new();
    site.add_page(
        &Feed::new("linux").listing_url(),
        &listing_html("linux", &["t3_a"]),
    );
    let page_two = "https://www.reddit.com/svc/shreddit/feeds/linux?after=x";
    site.add_page(page_two, &listing_html("linux", &["t3_b"]));
    site.push_event(page_two);
    for id in ["t3_a", "t3_b"] {
        site.add_page(&detail_url("linux", id), &detail_html(id, "body", None));
    }

    let orchestrator = Orchestrator::new(ctx.clone(), Arc::new(site), config());
    let summary = orchestrator.run_cycle(vec![Feed::new("linux")]).await;

    assert_eq!(summary.inserted, 2);
    assert_eq!(ctx.posts().count_for_feed("linux").await.unwrap(), 2);
}

#[tokio::test]
async fn second_cycle_is_idempotent() {
    let (ctx, _dir) = setup_db().await;

    let site = FakeSite::new();
    site.add_page(
        &Feed::new("linux").listing_url(),
        &listing_html("linux", &["t3_a"]),
    );
    site.add_page(
        &detail_url("linux", "t3_a"),
        &detail_html("t3_a", "body", Some("hello")),
    );

    let orchestrator = Orchestrator::new(ctx.clone(), Arc::new(site), config());

    let first = orchestrator.run_cycle(vec![Feed::new("linux")]).await;
    assert_eq!(first.inserted, 1);

    let second = orchestrator.run_cycle(vec![Feed::new("linux")]).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.feeds_ok, 1);

    // No duplicated rows, post or comment
    let repo = ctx.posts();
    assert_eq!(repo.count_for_feed("linux").await.unwrap(), 1);
    assert_eq!(repo.comment_count_for_feed("linux").await.unwrap(), 1);
}

#[tokio::test]
async fn one_broken_feed_leaves_the_rest_untouched() {
    let (ctx, _dir) = setup_db().await;

    let site = FakeSite::new();
    site.add_page(
        &Feed::new("linux").listing_url(),
        &listing_html("linux", &["t3_a"]),
    );
    site.add_page(
        &detail_url("linux", "t3_a"),
        &detail_html("t3_a", "body", None),
    );
    site.break_url(&Feed::new("down").listing_url());

    let orchestrator = Orchestrator::new(ctx.clone(), Arc::new(site), config());
    let summary = orchestrator
        .run_cycle(vec![Feed::new("linux"), Feed::new("down")])
        .await;

    assert_eq!(summary.feeds_ok, 1);
    assert_eq!(summary.feeds_failed, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(ctx.posts().count_for_feed("linux").await.unwrap(), 1);
}
