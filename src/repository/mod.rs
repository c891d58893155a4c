//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over SQLite, wrapped for async use via diesel-async's
//! SyncConnectionWrapper.

pub mod context;
pub mod diesel_models;
pub mod diesel_pool;
pub mod post;
mod util;

pub use context::DbContext;
pub use diesel_pool::{AsyncSqlitePool, DieselError};
pub use post::{InsertOutcome, PostRepository};
