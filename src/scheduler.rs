//! Jittered daily run planning.
//!
//! Once per day a fresh plan is drawn: a random start minute inside the
//! opening hour, then runs spaced by independently jittered gaps until the
//! window closes. Replanning daily rather than once at startup keeps the
//! minute-level pattern from repeating across days.

use chrono::{DateTime, Local, NaiveDate, Timelike};
use tracing::{debug, info};

use crate::config::ScheduleConfig;

/// One planned run time within a day, local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledRun {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduledRun {
    fn minutes(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl std::fmt::Display for ScheduledRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Draw a day's worth of jittered run times within the configured window.
///
/// The first run lands at a uniformly random minute of the opening hour;
/// each following run is the previous plus a gap drawn from
/// `[min_gap_minutes, max_gap_minutes)`. Runs at or past `end_hour` are
/// never planned. An inverted window yields an empty plan.
pub fn plan_day(config: &ScheduleConfig) -> Vec<ScheduledRun> {
    if config.end_hour <= config.start_hour {
        return Vec::new();
    }

    let end = config.end_hour * 60;
    let gap_span = config
        .max_gap_minutes
        .saturating_sub(config.min_gap_minutes)
        .max(1);

    let mut runs = Vec::new();
    let mut t = config.start_hour * 60 + fastrand::u32(0..60);
    while t < end {
        runs.push(ScheduledRun {
            hour: t / 60,
            minute: t % 60,
        });
        // Zero-gap configs still have to advance
        t += (config.min_gap_minutes + fastrand::u32(0..gap_span)).max(1);
    }
    runs
}

/// Tracks the current day's plan and hands out runs as they come due.
pub struct Scheduler {
    config: ScheduleConfig,
    planned_for: Option<NaiveDate>,
    pending: Vec<ScheduledRun>,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            planned_for: None,
            pending: Vec::new(),
        }
    }

    /// Advance the scheduler to `now`, returning every run that has come
    /// due since the last tick. Replans when the day rolls over (at or
    /// after the planning hour); runs already in the past at planning
    /// time are dropped rather than fired in a burst.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<ScheduledRun> {
        let today = now.date_naive();
        if self.planned_for != Some(today) && now.hour() >= self.config.plan_hour {
            self.replan(now);
        }

        let now_minutes = now.hour() * 60 + now.minute();
        let due: Vec<ScheduledRun> = self
            .pending
            .iter()
            .copied()
            .filter(|run| run.minutes() <= now_minutes)
            .collect();
        self.pending.retain(|run| run.minutes() > now_minutes);

        if !due.is_empty() {
            debug!(due = due.len(), remaining = self.pending.len(), "runs due");
        }
        due
    }

    /// The current plan's remaining runs, in order.
    pub fn pending(&self) -> &[ScheduledRun] {
        &self.pending
    }

    fn replan(&mut self, now: DateTime<Local>) {
        let now_minutes = now.hour() * 60 + now.minute();
        let mut plan = plan_day(&self.config);
        plan.retain(|run| run.minutes() > now_minutes);

        info!(
            date = %now.date_naive(),
            runs = plan.len(),
            "planned today's runs"
        );
        self.planned_for = Some(now.date_naive());
        self.pending = plan;
    }
}
