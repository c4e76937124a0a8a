use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting gate shared by every bucket and object task of a cycle.
///
/// A [`Slot`] must be held for the duration of each network call and is
/// returned when dropped, including when the holding task is cancelled.
#[derive(Debug, Clone)]
pub struct Governor {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// One admitted unit of network I/O.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl Governor {
    /// Creates a gate with `capacity` slots (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot. Slots are granted in request order.
    ///
    /// # Errors
    ///
    /// Returns an error once the gate has been closed.
    pub async fn acquire(&self) -> Result<Slot, AcquireError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;
        Ok(Slot { _permit: permit })
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuses all pending and future acquisitions; held slots stay valid.
    pub fn close(&self) {
        self.permits.close();
    }
}
