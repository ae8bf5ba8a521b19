use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::PipelineError;

/// Fixed-size pool of download slots.
///
/// Exactly `capacity` slots exist for the life of the pool. A [`Slot`] is
/// returned to the pool when it is dropped, so it cannot leak or be released
/// twice.
#[derive(Debug, Clone)]
pub struct SlotPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of permission to run a download.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl SlotPool {
    /// Creates a pool with `capacity` slots, all free.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until a slot is free and takes it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SlotsClosed`] if the pool was closed.
    pub async fn acquire(&self) -> Result<Slot, PipelineError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::SlotsClosed)?;
        Ok(Slot { _permit: permit })
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of slots currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Wakes every waiter with an error; used on fatal shutdown.
    pub fn close(&self) {
        self.semaphore.close();
    }
}
