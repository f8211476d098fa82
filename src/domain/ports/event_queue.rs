use async_trait::async_trait;

use crate::domain::ports::errors::QueueError;

/// Shared FIFO of externally produced events.
///
/// A pop is destructive: each entry is handed to exactly one consumer.
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Wait until an entry is available and remove it
    async fn blocking_pop(&self) -> Result<Vec<u8>, QueueError>;
}
