use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle to a pending timer. Canceling prevents the callback from
/// running even if the underlying sleep has already elapsed. Clones share
/// identity with the original, so the owner of the scheduled work can
/// match a firing timer against the handle it stored.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    canceled: Arc<AtomicBool>,
}

impl TimerHandle {
    /// A fresh handle not yet tied to a scheduled timer.
    pub fn new() -> Self {
        TimerHandle {
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// True when both handles refer to the same scheduled timer.
    pub fn same_timer(&self, other: &TimerHandle) -> bool {
        Arc::ptr_eq(&self.canceled, &other.canceled)
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `on_fire` after `delay` on the current arbiter, unless the
/// returned handle is canceled first. The callback receives its own
/// handle so it can be re-checked against stored state after any locks
/// are acquired; the pre-fire flag check alone is racy against a cancel
/// that lands between the check and the lock.
pub fn schedule<F>(delay: Duration, on_fire: F) -> TimerHandle
where
    F: FnOnce(TimerHandle) + 'static,
{
    let handle = TimerHandle::new();
    let task_handle = handle.clone();
    actix_rt::spawn(async move {
        actix_rt::time::sleep(delay).await;
        if !task_handle.is_canceled() {
            on_fire(task_handle);
        }
    });
    handle
}
