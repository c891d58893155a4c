//! Diesel-based post repository.
//!
//! Posts and their comments are persisted together in one transaction.
//! The `posts.id` primary key enforces at-most-once persistence: a racing
//! duplicate insert surfaces as [`InsertOutcome::Conflict`] rather than
//! corrupting state.

use std::collections::HashSet;

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::diesel_models::{CommentRecord, NewComment, NewPost, PostRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use crate::models::{Comment, Post, PostKind};
use crate::schema::{comments, posts};

/// Outcome of a post insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The post and its comments were persisted.
    Inserted,
    /// A post with this id already exists; nothing was written.
    Conflict,
}

/// Convert a database record plus its comment rows into a domain post.
fn into_post(record: PostRecord, comment_rows: Vec<CommentRecord>) -> Post {
    Post {
        id: record.id,
        title: record.title,
        author: record.author,
        author_id: record.author_id,
        kind: PostKind::from_str(&record.kind),
        feed: record.feed,
        url: record.url,
        score: record.score,
        content: record.content,
        images: serde_json::from_str(&record.images).unwrap_or_default(),
        video: record.video,
        comments: comment_rows.into_iter().map(Comment::from).collect(),
    }
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Comment {
            id: record.id,
            post_id: record.post_id,
            author: record.author,
            parent_id: record.parent_id,
            content_type: record.content_type,
            content: record.content,
        }
    }
}

/// Diesel-based post repository with compile-time query checking.
#[derive(Clone)]
pub struct PostRepository {
    pool: AsyncSqlitePool,
}

impl PostRepository {
    /// Create a new post repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// All known post ids for one feed.
    pub async fn ids_for_feed(&self, feed: &str) -> Result<HashSet<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        let ids: Vec<String> = posts::table
            .filter(posts::feed.eq(feed))
            .select(posts::id)
            .load(&mut conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// Insert a post and its comments in one transaction.
    ///
    /// A unique violation on the post id rolls the whole transaction back
    /// and reports [`InsertOutcome::Conflict`].
    pub async fn insert(&self, post: &Post) -> Result<InsertOutcome, DieselError> {
        let mut conn = self.pool.get().await?;

        let images_json =
            serde_json::to_string(&post.images).unwrap_or_else(|_| "[]".to_string());
        let harvested_at = Utc::now().to_rfc3339();

        let new_post = NewPost {
            id: &post.id,
            title: &post.title,
            author: &post.author,
            author_id: &post.author_id,
            kind: post.kind.as_str(),
            feed: &post.feed,
            url: &post.url,
            score: post.score,
            content: &post.content,
            images: &images_json,
            video: post.video.as_deref(),
            harvested_at: &harvested_at,
        };

        let new_comments: Vec<NewComment> = post
            .comments
            .iter()
            .map(|c| NewComment {
                id: &c.id,
                post_id: &c.post_id,
                author: &c.author,
                parent_id: c.parent_id.as_deref(),
                content_type: &c.content_type,
                content: &c.content,
            })
            .collect();

        let result = conn
            .transaction(|conn| {
                Box::pin(async move {
                    diesel::insert_into(posts::table)
                        .values(&new_post)
                        .execute(conn)
                        .await?;

                    // SQLite has no multi-row insert support through
                    // diesel-async; insert row by row, as diesel's own
                    // sync SQLite batch path does.
                    for new_comment in &new_comments {
                        diesel::insert_into(comments::table)
                            .values(new_comment)
                            .execute(conn)
                            .await?;
                    }

                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(e),
        }
    }

    /// Get a post with its comments.
    pub async fn get(&self, id: &str) -> Result<Option<Post>, DieselError> {
        let mut conn = self.pool.get().await?;

        let record = posts::table
            .find(id)
            .first::<PostRecord>(&mut conn)
            .await
            .optional()?;

        let Some(record) = record else {
            return Ok(None);
        };

        let comment_rows: Vec<CommentRecord> = comments::table
            .filter(comments::post_id.eq(id))
            .load(&mut conn)
            .await?;

        Ok(Some(into_post(record, comment_rows)))
    }

    /// Number of persisted posts for one feed.
    pub async fn count_for_feed(&self, feed: &str) -> Result<i64, DieselError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;

        posts::table
            .filter(posts::feed.eq(feed))
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Number of persisted comments for one feed's posts.
    pub async fn comment_count_for_feed(&self, feed: &str) -> Result<i64, DieselError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;

        comments::table
            .inner_join(posts::table)
            .filter(posts::feed.eq(feed))
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Distinct feeds present in the store.
    pub async fn feeds(&self) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        posts::table
            .select(posts::feed)
            .distinct()
            .order(posts::feed.asc())
            .load(&mut conn)
            .await
    }
}
