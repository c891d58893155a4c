//! Diesel ORM models for database tables.
//!
//! These records provide compile-time type checking for database
//! operations. Image lists are serialized as JSON text.

use diesel::prelude::*;

use crate::schema;

/// Post record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    pub kind: String,
    pub feed: String,
    pub url: String,
    pub score: i64,
    pub content: String,
    pub images: String,
    pub video: Option<String>,
    pub harvested_at: String,
}

/// New post for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::posts)]
pub struct NewPost<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub author_id: &'a str,
    pub kind: &'a str,
    pub feed: &'a str,
    pub url: &'a str,
    pub score: i64,
    pub content: &'a str,
    pub images: &'a str,
    pub video: Option<&'a str>,
    pub harvested_at: &'a str,
}

/// Comment record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub parent_id: Option<String>,
    pub content_type: String,
    pub content: String,
}

/// New comment for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::comments)]
pub struct NewComment<'a> {
    pub id: &'a str,
    pub post_id: &'a str,
    pub author: &'a str,
    pub parent_id: Option<&'a str>,
    pub content_type: &'a str,
    pub content: &'a str,
}
