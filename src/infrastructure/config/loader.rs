use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Project configuration file
pub const CONFIG_FILE: &str = "gcservant.yaml";

/// Optional local overrides, not meant to be committed
pub const LOCAL_CONFIG_FILE: &str = "gcservant.local.yaml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "GCSERVANT_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Bot token is required (set bot.token or GCSERVANT_BOT__TOKEN)")]
    MissingToken,

    #[error("Bot username cannot be empty")]
    EmptyUsername,

    #[error("Invalid poll timeout: {0}. Must be at least 1 second")]
    InvalidPollTimeout(u64),

    #[error("Invalid {0}.max_parallel_tasks: must be at least 1")]
    InvalidParallelism(&'static str),

    #[error("Event queue name cannot be empty")]
    EmptyQueueName,

    #[error("Database URL cannot be empty")]
    EmptyDatabaseUrl,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid link token lifetime: must be at least 1 second")]
    InvalidTokenTtl,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Build the provider chain.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or `gcservant.yaml` then `gcservant.local.yaml`
    /// 3. Environment variables (`GCSERVANT_*`, `__` separates sections)
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let figment = match path {
            Some(path) => figment.merge(Yaml::file(path)),
            None => figment
                .merge(Yaml::file(CONFIG_FILE))
                .merge(Yaml::file(LOCAL_CONFIG_FILE)),
        };

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        if let Some(path) = path {
            anyhow::ensure!(path.exists(), "Config file {} not found", path.display());
        }

        let config: Config = Self::figment(path)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.bot.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        if config.bot.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        if config.bot.poll_timeout_secs == 0 {
            return Err(ConfigError::InvalidPollTimeout(config.bot.poll_timeout_secs));
        }

        if config.bot.max_parallel_tasks == 0 {
            return Err(ConfigError::InvalidParallelism("bot"));
        }

        if config.events.max_parallel_tasks == 0 {
            return Err(ConfigError::InvalidParallelism("events"));
        }

        if config.events.queue.is_empty() {
            return Err(ConfigError::EmptyQueueName);
        }

        if config.database.url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.link.token_ttl_secs == 0 {
            return Err(ConfigError::InvalidTokenTtl);
        }

        Ok(())
    }
}
