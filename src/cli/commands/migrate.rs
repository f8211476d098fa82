//! Implementation of the `gcservant migrate` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::sqlite::initialize_database;

pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let (config, _logger) = super::bootstrap(config_path)?;

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!(url = %config.database.url, "database schema is up to date");
    pool.close().await;

    Ok(())
}
