//! Day-plan preview command.

use console::style;

use crate::config::Settings;
use crate::scheduler::plan_day;

/// Print a freshly drawn day plan.
pub fn cmd_plan(settings: &Settings) -> anyhow::Result<()> {
    let plan = plan_day(&settings.schedule);
    if plan.is_empty() {
        println!(
            "{} Empty plan: window {:02}:00-{:02}:00 admits no runs",
            style("!").yellow(),
            settings.schedule.start_hour,
            settings.schedule.end_hour
        );
        return Ok(());
    }

    println!(
        "{} {} run(s) between {:02}:00 and {:02}:00:",
        style("✓").green(),
        plan.len(),
        settings.schedule.start_hour,
        settings.schedule.end_hour
    );
    for run in &plan {
        println!("  {}", run);
    }
    Ok(())
}
