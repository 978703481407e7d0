//! Debounced autosave scheduling.
//!
//! Every change reschedules a single one-shot timer; only when the document
//! has been quiet for the coalescing interval does the save actually run.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Holds at most one pending save timer.
#[derive(Debug)]
pub struct AutosaveScheduler {
    interval: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveScheduler {
    /// Create a scheduler that spawns its timers on `runtime`.
    #[must_use]
    pub fn new(interval: Duration, runtime: Handle) -> Self {
        Self {
            interval,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Cancel any pending save and run `save` once the interval has elapsed.
    ///
    /// `save` runs on the blocking pool, so it may do synchronous I/O.
    pub fn schedule<F>(&self, save: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let interval = self.interval;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            if let Err(e) = tokio::task::spawn_blocking(save).await {
                tracing::warn!("Autosave task failed: {e}");
            }
        }));
        tracing::trace!("Autosave scheduled in {:?}", interval);
    }

    /// Cancel the pending save, if any. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Check if a save is waiting for its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
