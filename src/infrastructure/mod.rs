//! Infrastructure layer module
//!
//! Adapters and ambient services around the domain:
//! - Configuration management
//! - Logging infrastructure
//! - Telegram Bot API client
//! - Companion web application client
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod telegram;
pub mod webapp;
