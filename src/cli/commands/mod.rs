//! Subcommand implementations

pub mod check_config;
pub mod migrate;
pub mod register;
pub mod run;

use std::path::Path;

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;

/// Load configuration and install logging.
///
/// The returned logger must outlive the command.
pub(crate) fn bootstrap(config_path: Option<&Path>) -> Result<(Config, LoggerImpl)> {
    let config = ConfigLoader::load(config_path)?;
    let logger = LoggerImpl::init(&config.logging)?;
    Ok((config, logger))
}
