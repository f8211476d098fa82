//! Implementation of the `gcservant check-config` command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::infrastructure::config::ConfigLoader;

pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let yaml = serde_yaml::to_string(&config.redacted())
        .context("Failed to serialize configuration")?;

    println!("{yaml}");
    Ok(())
}
