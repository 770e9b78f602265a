//! Debounced trigger for quota sweeps.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::QuotaManager;

/// Runs a sweep once uploads have been quiet for the debounce period.
///
/// Each [`schedule`](Self::schedule) replaces the pending debounce timer, so
/// at most one is ever waiting. A sweep that has started always runs to
/// completion, and sweeps never overlap.
pub struct QuotaScheduler {
    manager: Arc<QuotaManager>,
    debounce: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    sweep: Arc<tokio::sync::Mutex<()>>,
}

impl QuotaScheduler {
    pub fn new(manager: Arc<QuotaManager>, debounce: Duration) -> Self {
        Self {
            manager,
            debounce,
            timer: Mutex::new(None),
            sweep: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Cancel the pending timer and start a new debounce period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self) {
        let manager = Arc::clone(&self.manager);
        let sweep = Arc::clone(&self.sweep);
        let debounce = self.debounce;

        let mut timer = self.lock_timer();
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let running = sweep.lock_owned().await;
            // Detached from the timer: aborting the timer must never cut a
            // sweep between the remote delete and the local bookkeeping.
            tokio::spawn(async move {
                let _running = running;
                if let Err(e) = manager.enforce().await {
                    warn!(error = %e, "Quota sweep failed");
                }
            });
        }));
        debug!(debounce_secs = debounce.as_secs(), "Quota sweep scheduled");
    }

    /// Drop the pending timer, if any. A sweep already running is unaffected.
    pub fn cancel(&self) {
        if let Some(previous) = self.lock_timer().take() {
            previous.abort();
        }
    }

    /// Whether a sweep is waiting or running.
    pub fn is_pending(&self) -> bool {
        let waiting = self
            .lock_timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        waiting || self.sweep.try_lock().is_err()
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for QuotaScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
