//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty stdout output
//! - Optional rolling JSON log files
//! - Bot token scrubbing and update redaction

pub mod logger;
pub mod secret_scrubbing;

pub use logger::LoggerImpl;
pub use secret_scrubbing::{redact_update, SecretScrubber, MASK, REDACTED_FIELDS};
