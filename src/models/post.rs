//! Post and comment models.
//!
//! `PostSummary` is the minimal record a listing page yields; `PostDetail`
//! is what a detail page adds. A persisted `Post` is the merge of the two.

use serde::{Deserialize, Serialize};

/// Kind of post, as reported by the listing markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Text,
    Link,
    Crosspost,
    Image,
    Video,
    Gallery,
    Other,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::Crosspost => "crosspost",
            Self::Image => "image",
            Self::Video => "video",
            Self::Gallery => "gallery",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "link" => Self::Link,
            "crosspost" => Self::Crosspost,
            "image" => Self::Image,
            "video" => Self::Video,
            "gallery" => Self::Gallery,
            _ => Self::Other,
        }
    }

    /// Kinds that carry an original external resource reference.
    pub fn references_external(&self) -> bool {
        matches!(self, Self::Crosspost | Self::Link)
    }
}

/// Minimal listing-derived record for one candidate post.
///
/// Immutable once produced; `id` is the dedup key within a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Globally unique post id within the feed (dedup key).
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    pub kind: PostKind,
    /// Feed this candidate was discovered in.
    pub feed: String,
    /// Site-relative permalink to the detail page.
    pub url: String,
    pub score: i64,
}

/// A single comment extracted from a detail page. Only textual comments
/// are retained; other content types are dropped during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    /// Parent comment id, absent for top-level comments. Stored flat;
    /// thread reconstruction is out of scope.
    pub parent_id: Option<String>,
    pub content_type: String,
    pub content: String,
}

/// Detail-page record for one post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    /// Newline-joined paragraph text; empty when the post has no body.
    pub content: String,
    /// Image references in document order, lightbox images first.
    pub images: Vec<String>,
    /// Embedded player source, when present.
    pub video: Option<String>,
    pub comments: Vec<Comment>,
}

/// Outcome of a detail fetch. `NotFound` means "skip this one item",
/// never "abort the feed".
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Found(PostDetail),
    NotFound,
}

/// A fully harvested post, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    pub kind: PostKind,
    pub feed: String,
    pub url: String,
    pub score: i64,
    pub content: String,
    pub images: Vec<String>,
    pub video: Option<String>,
    pub comments: Vec<Comment>,
}

impl Post {
    /// Merge a listing summary with its detail record.
    pub fn from_parts(summary: PostSummary, detail: PostDetail) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            author: summary.author,
            author_id: summary.author_id,
            kind: summary.kind,
            feed: summary.feed,
            url: summary.url,
            score: summary.score,
            content: detail.content,
            images: detail.images,
            video: detail.video,
            comments: detail.comments,
        }
    }
}
