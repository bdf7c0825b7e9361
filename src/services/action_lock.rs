use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Time-boxed gate that rejects feedback while the previous action settles
///
/// `is_locked` is the synchronous check used by the action handlers; the
/// watch channel from `subscribe` carries the same state to whatever renders
/// the controls. Unlocking is a scheduled task that a later `engage`
/// replaces.
#[derive(Clone)]
pub struct ActionLock {
    inner: Arc<LockInner>,
}

struct LockInner {
    locked: AtomicBool,
    signal: watch::Sender<bool>,
    release: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ActionLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLock {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            inner: Arc::new(LockInner {
                locked: AtomicBool::new(false),
                signal,
                release: Mutex::new(None),
            }),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.locked.load(Ordering::Acquire)
    }

    /// Locks now and schedules the unlock after `duration`
    pub fn engage(&self, duration: Duration) {
        self.inner.set(true);

        let weak: Weak<LockInner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.set(false);
            }
        });

        let mut release = self
            .inner
            .release
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = release.replace(task) {
            previous.abort();
        }
    }

    /// Engages the lock unless it is already held
    ///
    /// Returns false, leaving the pending unlock alone, when another action
    /// holds the lock.
    pub fn try_engage(&self, duration: Duration) -> bool {
        if self
            .inner
            .locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.engage(duration);
        true
    }

    /// Drops any pending unlock and opens the gate immediately
    pub fn release(&self) {
        let mut release = self
            .inner
            .release
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(pending) = release.take() {
            pending.abort();
        }
        self.inner.set(false);
    }

    /// Lock state for render-driven consumers
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.signal.subscribe()
    }
}

impl LockInner {
    fn set(&self, locked: bool) {
        self.locked.store(locked, Ordering::Release);
        self.signal.send_replace(locked);
    }
}

impl Drop for LockInner {
    fn drop(&mut self) {
        if let Ok(mut release) = self.release.lock() {
            if let Some(pending) = release.take() {
                pending.abort();
            }
        }
    }
}
