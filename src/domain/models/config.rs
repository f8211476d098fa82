use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for gcservant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Chat-platform bot settings
    #[serde(default)]
    pub bot: BotConfig,

    /// External event queue settings
    #[serde(default)]
    pub events: EventsConfig,

    /// Companion web application
    #[serde(default)]
    pub webapp: WebappConfig,

    /// Account linking
    #[serde(default)]
    pub link: LinkConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Copy safe to print, with the bot token masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.bot.token.is_empty() {
            config.bot.token = "***".to_string();
        }
        config
    }
}

/// Bot identity and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BotConfig {
    /// Bot API token (usually supplied through `GCSERVANT_BOT__TOKEN`)
    #[serde(default)]
    pub token: String,

    /// Username commands may be addressed to (`/cmd@username`)
    #[serde(default = "default_username")]
    pub username: String,

    /// Bot API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Server-side long-poll interval in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Timeout for ordinary API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of concurrently running command handlers
    #[serde(default = "default_bot_parallel_tasks")]
    pub max_parallel_tasks: usize,

    /// Publish the public command list on startup
    #[serde(default)]
    pub register_commands: bool,
}

fn default_username() -> String {
    "gcservantbot".to_string()
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

const fn default_poll_timeout_secs() -> u64 {
    60
}

const fn default_request_timeout_secs() -> u64 {
    5
}

const fn default_bot_parallel_tasks() -> usize {
    10
}

/// Extra time granted to the HTTP layer on top of the long-poll interval.
const LONG_POLL_GRACE_SECS: u64 = 5;

impl BotConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// HTTP timeout for `getUpdates`, strictly longer than the poll interval.
    pub fn long_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs + LONG_POLL_GRACE_SECS)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            username: default_username(),
            api_base_url: default_api_base_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_parallel_tasks: default_bot_parallel_tasks(),
            register_commands: false,
        }
    }
}

/// External event queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventsConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Name of the list events are popped from
    #[serde(default = "default_queue")]
    pub queue: String,

    /// Maximum number of concurrently running event handlers
    #[serde(default = "default_event_parallel_tasks")]
    pub max_parallel_tasks: usize,
}

fn default_redis_url() -> String {
    "redis://redis".to_string()
}

fn default_queue() -> String {
    "bot_messages".to_string()
}

const fn default_event_parallel_tasks() -> usize {
    5
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            queue: default_queue(),
            max_parallel_tasks: default_event_parallel_tasks(),
        }
    }
}

/// Companion web application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebappConfig {
    #[serde(default = "default_webapp_url")]
    pub base_url: String,

    #[serde(default = "default_webapp_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_webapp_url() -> String {
    "http://webapp:8000".to_string()
}

const fn default_webapp_timeout_secs() -> u64 {
    10
}

impl Default for WebappConfig {
    fn default() -> Self {
        Self {
            base_url: default_webapp_url(),
            timeout_secs: default_webapp_timeout_secs(),
        }
    }
}

/// Account linking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkConfig {
    /// Lifetime of a one-time link token in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

const fn default_token_ttl_secs() -> u64 {
    900
}

impl LinkConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite:data/gcservant.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Stdout format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for log files (stdout only when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}
