//! Database context managing the connection factory and repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::post::PostRepository;

/// Database context. Create one per command, then use it to access
/// repositories.
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get a post repository.
    pub fn posts(&self) -> PostRepository {
        PostRepository::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// Creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        conn.batch_execute(
            r#"
            -- Posts table
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                author_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                feed TEXT NOT NULL,
                url TEXT NOT NULL,
                score INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL DEFAULT '',
                images TEXT NOT NULL DEFAULT '[]',
                video TEXT,
                harvested_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_feed ON posts(feed);
            CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author);

            -- Comments table
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                author TEXT NOT NULL,
                parent_id TEXT,
                content_type TEXT NOT NULL,
                content TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id)
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
            "#,
        )
        .await?;

        Ok(())
    }
}
