//! Configuration management for redharvest.
//!
//! Settings come from an optional TOML file in the data directory plus
//! built-in defaults. Everything the harvester needs at runtime (feeds,
//! pacing, schedule window, browser options) is carried explicitly here;
//! there is no module-level mutable state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::browser::BrowserEngineConfig;
use crate::models::Feed;

/// Default database filename inside the data directory.
const DEFAULT_DATABASE_FILENAME: &str = "redharvest.db";

/// Default config filename inside the data directory.
const DEFAULT_CONFIG_FILENAME: &str = "config.toml";

/// Harvest engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Number of new candidates to aim for per feed per cycle.
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Number of feeds processed concurrently (admission pool size).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How long to wait for a pagination network event after a scroll, in ms.
    #[serde(default = "default_listing_settle_ms")]
    pub listing_settle_ms: u64,

    /// How long to let a detail page settle after scrolling, in ms.
    #[serde(default = "default_detail_settle_ms")]
    pub detail_settle_ms: u64,

    /// Hard cap on pagination rounds per feed per cycle. Guards against a
    /// feed that keeps emitting events without yielding new candidates.
    #[serde(default = "default_max_pagination_rounds")]
    pub max_pagination_rounds: usize,

    /// Override for the pagination endpoint pattern (regex). When unset,
    /// each feed derives its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_pattern: Option<String>,
}

fn default_target_count() -> usize {
    25
}

fn default_workers() -> usize {
    3
}

fn default_listing_settle_ms() -> u64 {
    5000
}

fn default_detail_settle_ms() -> u64 {
    3000
}

fn default_max_pagination_rounds() -> usize {
    8
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            workers: default_workers(),
            listing_settle_ms: default_listing_settle_ms(),
            detail_settle_ms: default_detail_settle_ms(),
            max_pagination_rounds: default_max_pagination_rounds(),
            pagination_pattern: None,
        }
    }
}

/// Daily run window and jitter bounds for the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// First hour of the day (local time) in which runs may start.
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// Hour at which the run window closes; no run is planned at or past it.
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Hour at which the day plan itself is recomputed.
    #[serde(default = "default_plan_hour")]
    pub plan_hour: u32,

    /// Minimum gap between consecutive runs, in minutes.
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: u32,

    /// Exclusive upper bound on the gap between consecutive runs, in minutes.
    #[serde(default = "default_max_gap_minutes")]
    pub max_gap_minutes: u32,

    /// How often the run loop polls for due runs, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_start_hour() -> u32 {
    9
}

fn default_end_hour() -> u32 {
    22
}

fn default_plan_hour() -> u32 {
    0
}

fn default_min_gap_minutes() -> u32 {
    25
}

fn default_max_gap_minutes() -> u32 {
    31
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            plan_hour: default_plan_hour(),
            min_gap_minutes: default_min_gap_minutes(),
            max_gap_minutes: default_max_gap_minutes(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// On-disk configuration file contents. Every field is optional; anything
/// absent falls back to a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base data directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Database filename or path override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Feed names to harvest.
    #[serde(default)]
    pub feeds: Vec<String>,

    /// Harvest engine tuning.
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Daily schedule window.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Browser engine options.
    #[serde(default)]
    pub browser: BrowserEngineConfig,
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename (relative to the data directory unless absolute).
    pub database_filename: String,
    /// Feed names to harvest.
    pub feeds: Vec<String>,
    /// Harvest engine tuning.
    pub harvest: HarvestConfig,
    /// Daily schedule window.
    pub schedule: ScheduleConfig,
    /// Browser engine options.
    pub browser: BrowserEngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to the platform data dir, falling back to home / cwd
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("redharvest");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            feeds: Vec::new(),
            harvest: HarvestConfig::default(),
            schedule: ScheduleConfig::default(),
            browser: BrowserEngineConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.database_filename);
        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Full path to the config file inside the data directory.
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_CONFIG_FILENAME)
    }

    /// Check if the database file exists.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Create the data directory if needed.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    /// Configured feeds as domain objects.
    pub fn feed_list(&self) -> Vec<Feed> {
        self.feeds_by_name(&self.feeds)
    }

    /// Build feeds from explicit names, applying the configured pattern
    /// override.
    pub fn feeds_by_name(&self, names: &[String]) -> Vec<Feed> {
        names
            .iter()
            .map(|name| {
                let mut feed = Feed::new(name);
                if let Some(ref pattern) = self.harvest.pagination_pattern {
                    feed = feed.with_pagination_pattern(pattern);
                }
                feed
            })
            .collect()
    }

    /// Apply a parsed config file on top of these settings.
    fn apply_config(&mut self, config: Config) {
        if let Some(ref data_dir) = config.data_dir {
            let expanded = shellexpand::tilde(data_dir);
            self.data_dir = PathBuf::from(expanded.as_ref());
        }
        if let Some(database) = config.database {
            self.database_filename = database;
        }
        if !config.feeds.is_empty() {
            self.feeds = config.feeds;
        }
        self.harvest = config.harvest;
        self.schedule = config.schedule;
        self.browser = config.browser;
    }
}

/// Load settings, honoring an explicit data directory override and the
/// `REDHARVEST_DATA_DIR` environment variable, then the config file found
/// in the resolved data directory.
pub fn load_settings(data_dir: Option<PathBuf>) -> anyhow::Result<Settings> {
    let mut settings = match data_dir.or_else(data_dir_from_env) {
        Some(dir) => Settings::with_data_dir(dir),
        None => Settings::default(),
    };

    let config_path = settings.config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        settings.apply_config(config);
    }

    Ok(settings)
}

fn data_dir_from_env() -> Option<PathBuf> {
    std::env::var("REDHARVEST_DATA_DIR")
        .ok()
        .filter(|v| !v.is_empty())
        .map(|v| PathBuf::from(shellexpand::tilde(&v).as_ref()))
}

/// Render a default config file with a couple of placeholder feeds.
pub fn default_config_toml() -> String {
    let config = Config {
        feeds: vec!["linux".to_string(), "learnmachinelearning".to_string()],
        ..Default::default()
    };
    toml::to_string_pretty(&config).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.harvest.target_count, 25);
        assert_eq!(config.harvest.workers, 3);
        assert_eq!(config.schedule.min_gap_minutes, 25);
        assert_eq!(config.schedule.max_gap_minutes, 31);
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_config_overrides() {
        let toml_src = r#"
            feeds = ["linux", "rust"]

            [harvest]
            target_count = 10
            workers = 2

            [schedule]
            start_hour = 8
            end_hour = 20
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp/rh"));
        settings.apply_config(config);

        assert_eq!(settings.feeds, vec!["linux", "rust"]);
        assert_eq!(settings.harvest.target_count, 10);
        assert_eq!(settings.harvest.workers, 2);
        assert_eq!(settings.schedule.start_hour, 8);
        assert_eq!(settings.schedule.end_hour, 20);
        // Untouched fields keep defaults
        assert_eq!(settings.harvest.max_pagination_rounds, 8);
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/rh/redharvest.db"));
    }

    #[test]
    fn test_default_config_renders() {
        let rendered = default_config_toml();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.feeds.len(), 2);
    }
}
