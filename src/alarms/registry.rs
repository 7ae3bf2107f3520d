use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use crate::error::{AppError, AppResult};

/// Delivery guarantee a wake-up is registered with. Strongest first:
/// `AlarmClock` survives idle deferral and surfaces a user-visible
/// next-alarm affordance, `ExactWhileIdle` fires on time while idling,
/// `Exact` may be deferred under aggressive power saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WakeupTier {
    AlarmClock,
    ExactWhileIdle,
    Exact,
}

/// Payload handed to the trigger handler when an armed wake-up fires.
/// Carries the display label rather than a typed prayer so diagnostic
/// alarms ("Test") travel the same path as the real five.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSignal {
    pub alarm_id: i32,
    pub prayer_name: String,
}

impl AlarmSignal {
    pub fn new(alarm_id: i32, prayer_name: impl Into<String>) -> Self {
        Self {
            alarm_id,
            prayer_name: prayer_name.into(),
        }
    }
}

/// The platform alarm registry as the scheduler sees it. Registrations
/// are keyed by alarm id; re-registering an armed id replaces the prior
/// wake-up instead of stacking a second one.
pub trait WakeupRegistry: Send + Sync {
    fn register(
        &self,
        signal: AlarmSignal,
        fire_at: DateTime<Local>,
        tier: WakeupTier,
    ) -> AppResult<()>;

    /// No-op when nothing is armed under the id.
    fn cancel(&self, alarm_id: i32);

    fn armed_ids(&self) -> Vec<i32>;

    /// Most aggressive tier this runtime can honor.
    fn best_tier(&self) -> WakeupTier;

    /// Whether exact-time registrations are permitted at all.
    fn exact_allowed(&self) -> bool;

    /// Soonest AlarmClock-tier deadline, for next-alarm display.
    fn next_alarm_clock(&self) -> Option<DateTime<Local>>;
}

struct ArmedWakeup {
    handle: JoinHandle<()>,
    fire_at: DateTime<Local>,
    tier: WakeupTier,
}

/// In-process registry: one sleeper task per armed id, firing into an
/// mpsc channel the daemon's main loop consumes.
pub struct TokioWakeupRegistry {
    fire_tx: mpsc::UnboundedSender<AlarmSignal>,
    exact_allowed: bool,
    armed: Arc<Mutex<HashMap<i32, ArmedWakeup>>>,
}

impl TokioWakeupRegistry {
    pub fn new(exact_allowed: bool) -> (Self, mpsc::UnboundedReceiver<AlarmSignal>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        (
            Self {
                fire_tx,
                exact_allowed,
                armed: Arc::new(Mutex::new(HashMap::new())),
            },
            fire_rx,
        )
    }

    fn prune_finished(armed: &mut HashMap<i32, ArmedWakeup>) {
        armed.retain(|_, wakeup| !wakeup.handle.is_finished());
    }
}

impl WakeupRegistry for TokioWakeupRegistry {
    fn register(
        &self,
        signal: AlarmSignal,
        fire_at: DateTime<Local>,
        tier: WakeupTier,
    ) -> AppResult<()> {
        if !self.exact_allowed {
            return Err(AppError::permission_denied(
                "exact wake-ups are disabled for this runtime",
            ));
        }

        let alarm_id = signal.alarm_id;
        let millis_until = (fire_at.with_timezone(&Utc) - Utc::now()).num_milliseconds();
        // Guard against slight drift producing a negative duration
        let delay = Duration::from_millis(millis_until.max(0) as u64);
        let deadline = Instant::now() + delay;

        let fire_tx = self.fire_tx.clone();
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            debug!("Wake-up {} fired ({})", signal.alarm_id, signal.prayer_name);
            let _ = fire_tx.send(signal);
        });

        let mut armed = self.armed.lock().unwrap();
        Self::prune_finished(&mut armed);
        if let Some(previous) = armed.insert(alarm_id, ArmedWakeup { handle, fire_at, tier }) {
            // Same identity re-armed: the old sleeper must never fire
            previous.handle.abort();
            debug!("Wake-up {} replaced", alarm_id);
        }
        Ok(())
    }

    fn cancel(&self, alarm_id: i32) {
        if let Some(wakeup) = self.armed.lock().unwrap().remove(&alarm_id) {
            wakeup.handle.abort();
            debug!("Wake-up {} cancelled", alarm_id);
        }
    }

    fn armed_ids(&self) -> Vec<i32> {
        let mut armed = self.armed.lock().unwrap();
        Self::prune_finished(&mut armed);
        let mut ids: Vec<i32> = armed.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn best_tier(&self) -> WakeupTier {
        WakeupTier::AlarmClock
    }

    fn exact_allowed(&self) -> bool {
        self.exact_allowed
    }

    fn next_alarm_clock(&self) -> Option<DateTime<Local>> {
        let mut armed = self.armed.lock().unwrap();
        Self::prune_finished(&mut armed);
        armed
            .values()
            .filter(|wakeup| wakeup.tier == WakeupTier::AlarmClock)
            .map(|wakeup| wakeup.fire_at)
            .min()
    }
}
