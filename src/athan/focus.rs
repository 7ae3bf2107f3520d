use std::sync::{Arc, Mutex};

use log::{debug, info};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Exclusive focus over the audio output. At most one grant is live at a
/// time; granting a new requester revokes the previous holder through
/// its revocation channel, which the holder must treat as a stop order.
#[derive(Clone)]
pub struct FocusArbiter {
    inner: Arc<Mutex<ArbiterState>>,
}

struct ArbiterState {
    refuse_all: bool,
    holder: Option<HolderEntry>,
}

struct HolderEntry {
    token: Uuid,
    revoke_tx: mpsc::UnboundedSender<()>,
}

/// Live focus grant. `revoked` fires when the arbiter hands focus to
/// someone else.
pub struct FocusGrant {
    pub token: Uuid,
    pub revoked: mpsc::UnboundedReceiver<()>,
}

impl FocusArbiter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ArbiterState {
                refuse_all: false,
                holder: None,
            })),
        }
    }

    /// Arbiter that denies every request, for exercising the
    /// focus-denied start path.
    pub fn refusing() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ArbiterState {
                refuse_all: true,
                holder: None,
            })),
        }
    }

    pub fn request_exclusive(&self) -> Option<FocusGrant> {
        let mut state = self.inner.lock().unwrap();
        if state.refuse_all {
            debug!("Audio focus request refused");
            return None;
        }

        if let Some(previous) = state.holder.take() {
            info!("Revoking audio focus from previous holder");
            let _ = previous.revoke_tx.send(());
        }

        let token = Uuid::new_v4();
        let (revoke_tx, revoked) = mpsc::unbounded_channel();
        state.holder = Some(HolderEntry { token, revoke_tx });
        debug!("Audio focus granted ({})", token);
        Some(FocusGrant { token, revoked })
    }

    /// Clears the grant if `token` still holds it; a stale abandon after
    /// focus moved on is a no-op.
    pub fn abandon(&self, token: Uuid) {
        let mut state = self.inner.lock().unwrap();
        if state.holder.as_ref().map(|h| h.token) == Some(token) {
            state.holder = None;
            debug!("Audio focus abandoned ({})", token);
        }
    }

    pub fn current_holder(&self) -> Option<Uuid> {
        self.inner.lock().unwrap().holder.as_ref().map(|h| h.token)
    }
}

impl Default for FocusArbiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grant_and_abandon() {
        let arbiter = FocusArbiter::new();
        let grant = arbiter.request_exclusive().unwrap();
        assert_eq!(arbiter.current_holder(), Some(grant.token));

        arbiter.abandon(grant.token);
        assert_eq!(arbiter.current_holder(), None);
    }

    #[tokio::test]
    async fn test_new_grant_revokes_previous_holder() {
        let arbiter = FocusArbiter::new();
        let mut first = arbiter.request_exclusive().unwrap();
        let second = arbiter.request_exclusive().unwrap();

        // The first holder got its revocation signal
        assert!(first.revoked.recv().await.is_some());
        assert_eq!(arbiter.current_holder(), Some(second.token));
    }

    #[tokio::test]
    async fn test_stale_abandon_is_noop() {
        let arbiter = FocusArbiter::new();
        let first = arbiter.request_exclusive().unwrap();
        let second = arbiter.request_exclusive().unwrap();

        // First holder abandoning after losing focus changes nothing
        arbiter.abandon(first.token);
        assert_eq!(arbiter.current_holder(), Some(second.token));
    }

    #[tokio::test]
    async fn test_refusing_arbiter_denies() {
        let arbiter = FocusArbiter::refusing();
        assert!(arbiter.request_exclusive().is_none());
        assert_eq!(arbiter.current_holder(), None);
    }
}
