//! Adapters for external systems.

pub mod redis;
pub mod sqlite;
