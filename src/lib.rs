//! Feed harvesting and archiving for subreddit-style boards.
//!
//! The library is organized around three cores: an incremental-pagination
//! crawl engine driven by observed network pagination events
//! ([`harvest::FeedPaginator`]), a bounded-concurrency orchestrator that
//! isolates per-item and per-feed failures ([`harvest::Orchestrator`]),
//! and a jittered daily scheduler ([`scheduler::Scheduler`]). Browser
//! automation, HTML extraction, and SQLite persistence live behind their
//! own modules.

pub mod browser;
pub mod cli;
pub mod config;
pub mod extract;
pub mod harvest;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scheduler;
