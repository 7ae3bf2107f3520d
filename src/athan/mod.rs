use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::alarms::AlarmSignal;
use crate::models::AthanSettings;
use crate::notify::{NotificationContent, Notifier, ATHAN_NOTIFICATION_ID};
use crate::utils::logging;

pub mod focus;
pub mod player;
pub mod wake;

pub use focus::{FocusArbiter, FocusGrant};
pub use player::{
    resolve_source, AthanPlayer, PlayerEvent, PlayerHandle, ResolvedSource, RodioAthanPlayer,
};
pub use wake::WakeLock;

/// The four ways a playing athan gets stopped. They are equivalent: all
/// of them funnel into the same idempotent teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Notification action or an external stop signal
    StopAction,
    /// Hardware volume key while the session is active
    VolumeKey,
    /// The focus arbiter handed the audio output to someone else
    FocusLoss,
    /// The playback thread reported a failure
    PlayerError,
}

/// Hardware keys the active media session intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    VolumeMute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Playing,
    Stopping,
    Terminated,
}

/// Everything the playback service needs to sound one athan.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub alarm_id: i32,
    pub prayer_name: String,
    pub volume: f32,
    pub custom_sound_path: Option<String>,
}

impl SessionRequest {
    pub fn from_settings(signal: &AlarmSignal, settings: &AthanSettings) -> Self {
        Self {
            alarm_id: signal.alarm_id,
            prayer_name: signal.prayer_name.clone(),
            volume: settings.clamped_volume(),
            custom_sound_path: settings.custom_sound_path.clone(),
        }
    }

    /// Fail-open request: default volume, no custom sound. Used when the
    /// settings fetch failed at trigger time.
    pub fn fallback(signal: &AlarmSignal) -> Self {
        Self {
            alarm_id: signal.alarm_id,
            prayer_name: signal.prayer_name.clone(),
            volume: 1.0,
            custom_sound_path: None,
        }
    }
}

struct ActiveSession {
    id: Uuid,
    seq: u64,
    prayer_name: String,
    alarm_id: i32,
    started_at: DateTime<Utc>,
    player_handle: PlayerHandle,
    focus_token: Uuid,
}

struct ServiceState {
    phase: SessionPhase,
    seq: u64,
    session: Option<ActiveSession>,
}

struct Inner {
    player: Arc<dyn AthanPlayer>,
    focus: FocusArbiter,
    notifier: Arc<dyn Notifier>,
    default_sound: Option<PathBuf>,
    wake_cap: Duration,
    wake: WakeLock,
    state: Mutex<ServiceState>,
}

/// Owns one audible athan end to end: wake lock, audio focus, looping
/// playback, the foreground notification and the teardown of all of it.
/// At most one session is live; starting over a playing session replaces
/// it, never overlaps it.
#[derive(Clone)]
pub struct AthanService {
    inner: Arc<Inner>,
}

impl AthanService {
    pub fn new(
        player: Arc<dyn AthanPlayer>,
        focus: FocusArbiter,
        notifier: Arc<dyn Notifier>,
        default_sound: Option<PathBuf>,
        wake_cap: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                player,
                focus,
                notifier,
                default_sound,
                wake_cap,
                wake: WakeLock::new(),
                state: Mutex::new(ServiceState {
                    phase: SessionPhase::Idle,
                    seq: 0,
                    session: None,
                }),
            }),
        }
    }

    /// Starts a session. Never returns an error: every failure mode ends
    /// in a logged, fully released terminal state, because a crash here
    /// would silence the alarm a user is depending on.
    pub fn start(&self, request: SessionRequest) {
        info!(
            "Starting athan session for {} (alarm {})",
            request.prayer_name, request.alarm_id
        );

        let mut state = self.inner.state.lock().unwrap();

        // Restart semantics: tear the live session down completely first
        if state.session.is_some() {
            info!("Replacing live athan session");
            self.teardown_locked(&mut state);
        }

        state.seq += 1;
        let seq = state.seq;
        state.phase = SessionPhase::Starting;

        self.inner.wake.acquire(self.inner.wake_cap);

        // Playback never begins without exclusive focus
        let grant = match self.inner.focus.request_exclusive() {
            Some(grant) => grant,
            None => {
                error!(
                    "Audio focus denied; athan for {} will not play",
                    request.prayer_name
                );
                self.inner.wake.release();
                state.phase = SessionPhase::Terminated;
                return;
            }
        };

        let source = resolve_source(
            request.custom_sound_path.as_deref(),
            self.inner.default_sound.as_deref(),
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let player_handle =
            match self
                .inner
                .player
                .play_looping(&source, request.volume, events_tx)
            {
                Ok(handle) => handle,
                Err(e) => {
                    error!("Failed to start athan playback: {}", e);
                    self.inner.focus.abandon(grant.token);
                    self.inner.wake.release();
                    state.phase = SessionPhase::Terminated;
                    return;
                }
            };

        let session = ActiveSession {
            id: Uuid::new_v4(),
            seq,
            prayer_name: request.prayer_name.clone(),
            alarm_id: request.alarm_id,
            started_at: Utc::now(),
            player_handle,
            focus_token: grant.token,
        };
        debug!("Athan session {} entering Playing", session.id);
        state.session = Some(session);
        state.phase = SessionPhase::Playing;
        logging::log_playback_event("Playback started", &request.prayer_name);

        if let Err(e) = self
            .inner
            .notifier
            .post(&NotificationContent::athan(&request.prayer_name))
        {
            warn!("Failed to post athan notification: {}", e);
        }

        self.spawn_session_watcher(seq, grant.revoked, events_rx);
    }

    /// Single stop funnel. Safe to call from any trigger any number of
    /// times; only the first call against a live session tears down.
    pub fn request_stop(&self, reason: StopReason) {
        let mut state = self.inner.state.lock().unwrap();
        match state.phase {
            SessionPhase::Starting | SessionPhase::Playing => {
                info!("Stopping athan ({:?})", reason);
                self.teardown_locked(&mut state);
            }
            _ => debug!("Stop requested ({:?}) with no active session", reason),
        }
    }

    /// Volume keys stop the athan, but only while a session is active.
    pub fn on_media_key(&self, key: MediaKey) {
        let active = {
            let state = self.inner.state.lock().unwrap();
            matches!(state.phase, SessionPhase::Starting | SessionPhase::Playing)
        };
        if active {
            info!("{:?} pressed while athan active; stopping", key);
            self.request_stop(StopReason::VolumeKey);
        } else {
            debug!("{:?} ignored; no athan session", key);
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.lock().unwrap().phase
    }

    pub fn wake_held(&self) -> bool {
        self.inner.wake.is_held()
    }

    pub fn current_prayer(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .unwrap()
            .session
            .as_ref()
            .map(|s| s.prayer_name.clone())
    }

    /// Stop scoped to one session generation, so a watcher for a
    /// replaced session can never kill its successor.
    fn request_stop_if_current(&self, seq: u64, reason: StopReason) {
        let mut state = self.inner.state.lock().unwrap();
        if state.session.as_ref().map(|s| s.seq) != Some(seq) {
            debug!("Stale stop ({:?}) for session {} ignored", reason, seq);
            return;
        }
        if matches!(state.phase, SessionPhase::Starting | SessionPhase::Playing) {
            info!("Stopping athan ({:?})", reason);
            self.teardown_locked(&mut state);
        }
    }

    fn teardown_locked(&self, state: &mut ServiceState) {
        state.phase = SessionPhase::Stopping;
        if let Some(session) = state.session.take() {
            session.player_handle.stop();
            // Each release below is individually guarded, so a racing
            // teardown observes no-ops instead of double releases
            self.inner.wake.release();
            self.inner.focus.abandon(session.focus_token);
            self.inner.notifier.clear(ATHAN_NOTIFICATION_ID);

            let played = Utc::now() - session.started_at;
            info!(
                "Athan session {} ({}) stopped after {}s",
                session.id,
                session.prayer_name,
                played.num_seconds()
            );
        }
        state.phase = SessionPhase::Terminated;
    }

    fn spawn_session_watcher(
        &self,
        seq: u64,
        mut revoked: mpsc::UnboundedReceiver<()>,
        mut events: mpsc::UnboundedReceiver<PlayerEvent>,
    ) {
        let service = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(()) = revoked.recv() => {
                        warn!("Audio focus lost while athan playing");
                        service.request_stop_if_current(seq, StopReason::FocusLoss);
                        break;
                    }
                    event = events.recv() => match event {
                        Some(PlayerEvent::Failed(msg)) => {
                            error!("Athan player reported failure: {}", msg);
                            service.request_stop_if_current(seq, StopReason::PlayerError);
                            break;
                        }
                        Some(PlayerEvent::Ended) => {
                            debug!("Athan playback thread exited");
                            break;
                        }
                        None => break,
                    },
                    else => break,
                }
            }
        });
    }
}
