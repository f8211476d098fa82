//! Domain layer for the gcservant bot
//!
//! Models of updates, commands, users and external events, plus the ports
//! the infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, ValidationError};
