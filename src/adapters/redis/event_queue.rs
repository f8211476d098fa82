//! Redis list backed event queue.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::trace;

use crate::domain::ports::{EventQueue, QueueError};

/// Pops events from a Redis list with `BLPOP`.
pub struct RedisEventQueue {
    manager: ConnectionManager,
    queue: String,
    pop_timeout: Duration,
}

impl RedisEventQueue {
    /// Server-side wait of a single `BLPOP` before it is reissued.
    pub const DEFAULT_POP_TIMEOUT: Duration = Duration::from_secs(5);

    pub async fn connect(redis_url: &str, queue: impl Into<String>) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::Connection(format!("invalid redis url: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        Ok(Self {
            manager,
            queue: queue.into(),
            pop_timeout: Self::DEFAULT_POP_TIMEOUT,
        })
    }
}

#[async_trait]
impl EventQueue for RedisEventQueue {
    async fn blocking_pop(&self) -> Result<Vec<u8>, QueueError> {
        let mut conn = self.manager.clone();
        let timeout = self.pop_timeout.as_secs_f64();
        loop {
            let popped: Option<(String, Vec<u8>)> = conn
                .blpop(&self.queue, timeout)
                .await
                .map_err(|e| QueueError::Connection(e.to_string()))?;

            match popped {
                Some((_, entry)) => return Ok(entry),
                None => trace!(queue = %self.queue, "queue idle"),
            }
        }
    }
}
