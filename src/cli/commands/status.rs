//! Status command.

use console::style;

use crate::config::Settings;
use crate::repository::DbContext;

/// Show per-feed post and comment counts.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        println!(
            "{} No database at {}; run `redh init` first",
            style("!").yellow(),
            settings.database_path().display()
        );
        return Ok(());
    }

    let ctx = DbContext::new(&settings.database_path());
    let repo = ctx.posts();

    let feeds = repo.feeds().await?;
    if feeds.is_empty() {
        println!("{} Database is empty; nothing harvested yet", style("·").dim());
        return Ok(());
    }

    println!("{:<24} {:>8} {:>10}", style("feed").bold(), "posts", "comments");
    let mut total_posts = 0;
    let mut total_comments = 0;
    for feed in &feeds {
        let posts = repo.count_for_feed(feed).await?;
        let comments = repo.comment_count_for_feed(feed).await?;
        total_posts += posts;
        total_comments += comments;
        println!("{:<24} {:>8} {:>10}", feed, posts, comments);
    }
    println!(
        "{:<24} {:>8} {:>10}",
        style("total").bold(),
        total_posts,
        total_comments
    );

    Ok(())
}
