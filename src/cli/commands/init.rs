//! Initialize command.

use std::fs;

use console::style;

use crate::config::{default_config_toml, Settings};
use crate::repository::DbContext;

/// Initialize the data directory, config file, and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let config_path = settings.config_path();
    if config_path.exists() {
        println!(
            "  {} Config already present: {}",
            style("·").dim(),
            config_path.display()
        );
    } else {
        fs::write(&config_path, default_config_toml())?;
        println!(
            "  {} Wrote default config: {}",
            style("✓").green(),
            config_path.display()
        );
    }

    let ctx = DbContext::new(&settings.database_path());
    ctx.init_schema().await?;
    println!(
        "  {} Database ready: {}",
        style("✓").green(),
        settings.database_path().display()
    );

    println!(
        "{} Initialized redharvest in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Edit the config to set your feeds, then run: redh harvest --all");

    Ok(())
}
