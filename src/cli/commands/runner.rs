//! Continuous scheduled-run command.

use std::time::Duration;

use chrono::Local;
use console::style;
use tracing::{error, info};

use super::harvest::{print_summary, resolve_feeds, run_one_cycle};
use crate::config::Settings;
use crate::scheduler::Scheduler;

/// Run one cycle immediately, then keep running on the jittered daily
/// schedule until interrupted.
pub async fn cmd_run(settings: &Settings) -> anyhow::Result<()> {
    let feeds = resolve_feeds(settings, &[], true)?;
    let config = settings.harvest.clone();

    println!(
        "{} Running initial cycle over {} feed(s)",
        style("→").cyan(),
        feeds.len()
    );
    let summary = run_one_cycle(settings, feeds.clone(), &config).await?;
    print_summary(&summary);

    let mut scheduler = Scheduler::new(settings.schedule);
    let poll = Duration::from_secs(settings.schedule.poll_interval_secs.max(1));
    println!(
        "{} Watching the schedule ({:02}:00-{:02}:00, poll every {}s)",
        style("→").cyan(),
        settings.schedule.start_hour,
        settings.schedule.end_hour,
        poll.as_secs()
    );

    loop {
        tokio::time::sleep(poll).await;

        for run in scheduler.tick(Local::now()) {
            info!(run = %run, "scheduled run due");
            // A failed cycle must not kill the loop; the next run still fires
            match run_one_cycle(settings, feeds.clone(), &config).await {
                Ok(summary) => print_summary(&summary),
                Err(e) => error!(error = %e, "scheduled cycle failed"),
            }
        }
    }
}
