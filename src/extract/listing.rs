//! Listing page extraction.
//!
//! A rendered listing page carries one custom element per post with all
//! summary fields as attributes. Candidates whose id is already known are
//! filtered out here so the paginator only ever accumulates new work.

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::debug;

use crate::models::{PostKind, PostSummary};

/// Extract candidate summaries from one rendered listing page, dropping
/// ids present in `known`. Output preserves document order.
pub fn extract_posts(html: &str, feed: &str, known: &HashSet<String>) -> Vec<PostSummary> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("shreddit-post").expect("static selector");

    let mut posts = Vec::new();
    for element in document.select(&selector) {
        let attr = |name: &str| element.value().attr(name).unwrap_or("").trim().to_string();

        let id = attr("id");
        if id.is_empty() {
            debug!("Skipping listing entry without id in {}", feed);
            continue;
        }
        if known.contains(&id) {
            continue;
        }

        posts.push(PostSummary {
            id,
            title: attr("post-title"),
            author: attr("author"),
            author_id: attr("author-id"),
            kind: PostKind::from_str(&attr("post-type")),
            feed: feed.to_string(),
            url: attr("permalink"),
            score: attr("score").parse().unwrap_or(0),
        });
    }

    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <shreddit-post id="t3_one" post-title="First post" author="alice"
            author-id="t2_a" post-type="text" subreddit-name="linux"
            permalink="/r/linux/comments/one/" score="12"></shreddit-post>
        <shreddit-post id="t3_two" post-title="Second post" author="bob"
            author-id="t2_b" post-type="link" subreddit-name="linux"
            permalink="/r/linux/comments/two/" score="3"></shreddit-post>
        <shreddit-post post-title="No id, dropped"></shreddit-post>
        </body></html>
    "#;

    #[test]
    fn test_extracts_summaries_in_document_order() {
        let posts = extract_posts(LISTING, "linux", &HashSet::new());
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "t3_one");
        assert_eq!(posts[0].title, "First post");
        assert_eq!(posts[0].kind, PostKind::Text);
        assert_eq!(posts[0].score, 12);
        assert_eq!(posts[0].feed, "linux");
        assert_eq!(posts[1].id, "t3_two");
        assert_eq!(posts[1].kind, PostKind::Link);
        assert_eq!(posts[1].url, "/r/linux/comments/two/");
    }

    #[test]
    fn test_known_ids_are_filtered() {
        let known: HashSet<String> = ["t3_one".to_string()].into_iter().collect();
        let posts = extract_posts(LISTING, "linux", &known);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "t3_two");
    }

    #[test]
    fn test_missing_attributes_default() {
        let html = r#"<shreddit-post id="t3_min"></shreddit-post>"#;
        let posts = extract_posts(html, "linux", &HashSet::new());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "");
        assert_eq!(posts[0].score, 0);
        assert_eq!(posts[0].kind, PostKind::Other);
    }

    #[test]
    fn test_empty_page_yields_empty_batch() {
        assert!(extract_posts("<html><body></body></html>", "linux", &HashSet::new()).is_empty());
        assert!(extract_posts("not even html", "linux", &HashSet::new()).is_empty());
    }
}
