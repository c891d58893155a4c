//! Domain models for harvested posts, comments, and feeds.

mod feed;
mod post;

pub use feed::Feed;
pub use post::{Comment, DetailOutcome, Post, PostDetail, PostKind, PostSummary};
