//! gcservant - Telegram bot for happiness-mj.xyz
//!
//! The bot long-polls the Bot API for updates, dispatches commands to a
//! bounded pool of handlers, and drains a shared Redis queue of events
//! produced by the web application (account linking, user notifications).
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Update, command, user and event models plus port traits
//! - **Service Layer** (`services`): Polling loop, event drain, handlers and the task manager
//! - **Adapters** (`adapters`): SQLite persistence and the Redis event queue
//! - **Infrastructure Layer** (`infrastructure`): Configuration, logging and HTTP clients
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{Config, DatabaseConfig, LoggingConfig};
pub use domain::ports::{ChatClient, EventQueue, LinkService, UserRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Bot, EventDrain, HandlerRegistry, TaskManager};
