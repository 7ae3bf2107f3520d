use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

/// Cooperative wake lock for an active playback session. Acquisition
/// arms a watchdog that forces release at the cap, so a session that
/// never tears down cannot keep the host awake indefinitely.
pub struct WakeLock {
    inner: Arc<Mutex<LockState>>,
}

struct LockState {
    held: bool,
    watchdog: Option<JoinHandle<()>>,
}

impl WakeLock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LockState {
                held: false,
                watchdog: None,
            })),
        }
    }

    /// Idempotent: acquiring an already-held lock leaves the original
    /// watchdog in place.
    pub fn acquire(&self, cap: Duration) {
        let mut state = self.inner.lock().unwrap();
        if state.held {
            debug!("Wake lock already held");
            return;
        }
        state.held = true;

        if let Some(stale) = state.watchdog.take() {
            stale.abort();
        }
        let inner = Arc::clone(&self.inner);
        state.watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(cap).await;
            let mut state = inner.lock().unwrap();
            if state.held {
                warn!("Wake lock held past its cap; forcing release");
                state.held = false;
                state.watchdog = None;
            }
        }));

        info!("Wake lock acquired (cap {}s)", cap.as_secs());
    }

    /// Releases only when held; racing releases are no-ops.
    pub fn release(&self) {
        let mut state = self.inner.lock().unwrap();
        if !state.held {
            return;
        }
        state.held = false;
        if let Some(watchdog) = state.watchdog.take() {
            watchdog.abort();
        }
        info!("Wake lock released");
    }

    pub fn is_held(&self) -> bool {
        self.inner.lock().unwrap().held
    }
}

impl Default for WakeLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let lock = WakeLock::new();
        assert!(!lock.is_held());

        lock.acquire(Duration::from_secs(600));
        assert!(lock.is_held());

        lock.release();
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_double_acquire_and_double_release() {
        let lock = WakeLock::new();
        lock.acquire(Duration::from_secs(600));
        lock.acquire(Duration::from_secs(600));
        assert!(lock.is_held());

        lock.release();
        lock.release();
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_watchdog_forces_release_at_cap() {
        let lock = WakeLock::new();
        lock.acquire(Duration::from_millis(100));
        assert!(lock.is_held());

        sleep(Duration::from_millis(400)).await;
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_release_disarms_watchdog() {
        let lock = WakeLock::new();
        lock.acquire(Duration::from_millis(100));
        lock.release();

        // Re-acquire with a long cap; the first watchdog must not fire
        // into this fresh hold.
        lock.acquire(Duration::from_secs(600));
        sleep(Duration::from_millis(300)).await;
        assert!(lock.is_held());

        lock.release();
    }
}
