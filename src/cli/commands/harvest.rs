//! One-shot harvest command and the shared cycle runner.

use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::browser::BrowserHandle;
use crate::config::{HarvestConfig, Settings};
use crate::harvest::{CycleSummary, Orchestrator};
use crate::models::Feed;
use crate::repository::DbContext;

/// Run one harvest cycle now.
pub async fn cmd_harvest(
    settings: &Settings,
    feeds: &[String],
    all: bool,
    target: Option<usize>,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let feed_list = resolve_feeds(settings, feeds, all)?;

    let mut config = settings.harvest.clone();
    if let Some(target) = target {
        config.target_count = target;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Harvesting {} feed(s)...", feed_list.len()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let summary = run_one_cycle(settings, feed_list, &config).await?;

    spinner.finish_and_clear();
    print_summary(&summary);
    Ok(())
}

/// Resolve the feeds to process for this invocation.
pub(super) fn resolve_feeds(
    settings: &Settings,
    names: &[String],
    all: bool,
) -> anyhow::Result<Vec<Feed>> {
    let feed_list = if !names.is_empty() && !all {
        settings.feeds_by_name(names)
    } else {
        settings.feed_list()
    };

    if feed_list.is_empty() {
        anyhow::bail!(
            "no feeds configured; add feeds to {} or name them on the command line",
            settings.config_path().display()
        );
    }
    Ok(feed_list)
}

/// Launch a browser, run one cycle over `feeds`, and tear the browser
/// down again. Startup failures (database, browser launch) are fatal;
/// everything inside the cycle is contained per feed.
pub(super) async fn run_one_cycle(
    settings: &Settings,
    feeds: Vec<Feed>,
    config: &HarvestConfig,
) -> anyhow::Result<CycleSummary> {
    settings.ensure_directories()?;

    let ctx = DbContext::new(&settings.database_path());
    ctx.init_schema().await?;

    let browser = Arc::new(BrowserHandle::launch(settings.browser.clone()).await?);

    let orchestrator = Orchestrator::new(ctx, browser.clone(), config.clone());
    let summary = orchestrator.run_cycle(feeds).await;

    browser.close().await;
    Ok(summary)
}

pub(super) fn print_summary(summary: &CycleSummary) {
    println!(
        "{} Cycle complete: {} inserted, {} already known, {} not found",
        style("✓").green(),
        style(summary.inserted).bold(),
        summary.conflicts + summary.skipped,
        summary.not_found,
    );
    if summary.item_failures > 0 {
        println!(
            "  {} {} item(s) failed and were skipped",
            style("!").yellow(),
            summary.item_failures
        );
    }
    if summary.feeds_failed > 0 {
        println!(
            "  {} {} feed(s) aborted (see logs)",
            style("!").yellow(),
            summary.feeds_failed
        );
    }
}
