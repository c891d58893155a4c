//! redharvest - feed harvesting and archiving for subreddit-style boards.
//!
//! Discovers newly published posts from configured feeds, fetches their
//! detail pages and comments through a rendered browser session, and
//! persists them on a jittered daily schedule.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redharvest::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "redharvest=info"
    } else {
        "redharvest=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
