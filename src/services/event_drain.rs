//! External event drain loop.
//!
//! Pops entries off the shared queue one at a time and hands each decoded
//! event to its handler through a dedicated task manager.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::domain::models::ExternalEvent;
use crate::domain::ports::EventQueue;
use crate::services::event_handlers::EventRouter;
use crate::services::task_manager::TaskManager;

pub struct EventDrain {
    queue: Arc<dyn EventQueue>,
    router: EventRouter,
    tasks: TaskManager,
}

impl EventDrain {
    pub const DEFAULT_MAX_PARALLEL_TASKS: usize = 5;

    pub fn new(queue: Arc<dyn EventQueue>, router: EventRouter, max_parallel_tasks: usize) -> Self {
        Self {
            queue,
            router,
            tasks: TaskManager::new("events", max_parallel_tasks),
        }
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.tasks
    }

    /// Drain the queue until `shutdown` resolves, then wait for in-flight
    /// handlers. A queue failure ends the loop with an error.
    pub async fn run_until<S>(&self, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()>,
    {
        info!(event_types = ?self.router.event_types(), "starting event drain loop");
        tokio::pin!(shutdown);

        let result = loop {
            let popped = tokio::select! {
                biased;
                () = &mut shutdown => break Ok(()),
                popped = self.queue.blocking_pop() => popped,
            };

            let entry = match popped.context("Event queue failed") {
                Ok(entry) => entry,
                Err(err) => break Err(err),
            };
            if let Err(err) = self.dispatch(&entry).await {
                break Err(err);
            }
        };

        info!("event drain loop stopping, waiting for in-flight handlers");
        self.tasks.shutdown().await;
        result
    }

    /// Decode one queue entry and submit it to its handler.
    ///
    /// Malformed entries and unknown event types are logged and dropped.
    pub async fn dispatch(&self, entry: &[u8]) -> anyhow::Result<()> {
        let event = match ExternalEvent::from_slice(entry) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, bytes = entry.len(), "skipping malformed event");
                return Ok(());
            }
        };

        let Some(handler) = self.router.route(&event.event_type) else {
            warn!(event_type = %event.event_type, event_id = %event.id, "no handler for event type");
            return Ok(());
        };

        debug!(event_type = %event.event_type, event_id = %event.id, "dispatching event");
        self.tasks
            .submit(async move { handler.handle(&event).await })
            .await?;
        Ok(())
    }
}
