//! Process-wide bot facts shared with handlers.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BotContext {
    started_at: Instant,
    version: &'static str,
}

impl Default for BotContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BotContext {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Human-readable status report.
    pub fn status(&self) -> String {
        format!(
            "Uptime: {}\nVersion: {}",
            format_interval(self.uptime()),
            self.version
        )
    }
}

/// Format as `H:MM:SS`, prefixed with the day count past 24 hours.
pub fn format_interval(interval: Duration) -> String {
    let total = interval.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{hours}:{minutes:02}:{seconds:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}
