//! Bounded task manager.
//!
//! Caps how many units of work run at once. Each submission holds one
//! semaphore permit for its whole lifetime; the permit and the live-set
//! entry live in a guard owned by the spawned task, so both are released
//! exactly once when the task ends, whether it succeeds, fails, panics or
//! is cancelled.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error};

/// Opaque identifier of an in-flight task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskManagerError {
    #[error("Task manager {0} is shut down")]
    ShutDown(&'static str),
}

type LiveSet = Arc<Mutex<HashSet<TaskId>>>;

fn lock(live: &LiveSet) -> MutexGuard<'_, HashSet<TaskId>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the task from the live set and frees its admission slot on drop.
struct InFlight {
    id: TaskId,
    live: LiveSet,
    _permit: OwnedSemaphorePermit,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.live).remove(&self.id);
    }
}

/// Semaphore-gated spawner with a fixed number of admission slots.
pub struct TaskManager {
    name: &'static str,
    capacity: usize,
    semaphore: Arc<Semaphore>,
    live: LiveSet,
    next_id: AtomicU64,
}

impl TaskManager {
    pub const DEFAULT_MAX_PARALLEL_TASKS: usize = 10;

    /// Create a manager admitting at most `capacity` concurrent tasks.
    ///
    /// A zero capacity is raised to one.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            live: Arc::new(Mutex::new(HashSet::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks currently running.
    pub fn in_flight(&self) -> usize {
        lock(&self.live).len()
    }

    /// Number of free admission slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot, then run `work` in the background.
    ///
    /// Returns as soon as the task is spawned. Errors returned by `work` are
    /// logged and end that task only.
    pub async fn submit<F>(&self, work: F) -> Result<TaskId, TaskManagerError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| TaskManagerError::ShutDown(self.name))?;

        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.live).insert(id);
        let guard = InFlight {
            id,
            live: Arc::clone(&self.live),
            _permit: permit,
        };
        let name = self.name;

        // No lock is held here: a runtime that is shutting down drops the
        // future, and with it the guard, inside `spawn`.
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(err) = work.await {
                error!(manager = name, task_id = %id, error = ?err, "task failed");
            }
        });

        debug!(manager = self.name, task_id = %id, "task submitted");
        Ok(id)
    }

    /// Stop admitting work and wait until every in-flight task has finished.
    pub async fn shutdown(&self) {
        let slots = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        // All permits back means no task holds a slot any more.
        if let Ok(permits) = self.semaphore.acquire_many(slots).await {
            permits.forget();
        }
        self.semaphore.close();
        debug!(manager = self.name, "task manager drained");
    }
}
