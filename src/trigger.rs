use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::alarms::AlarmSignal;
use crate::athan::SessionRequest;
use crate::error::AppResult;
use crate::utils::time::today_key;
use crate::AppState;

/// Reacts to a fired alarm by starting playback. Settings problems fail
/// open; a missed Athan is worse than a false-positive one.
pub async fn on_alarm_fired(state: &AppState, signal: AlarmSignal) {
    info!("Alarm {} fired for {}", signal.alarm_id, signal.prayer_name);

    let request = match state.db.get_athan_settings().await {
        Ok(Some(settings)) if !settings.enabled => {
            info!("Athan is disabled, ignoring alarm for {}", signal.prayer_name);
            return;
        }
        Ok(Some(settings)) => SessionRequest::from_settings(&signal, &settings),
        Ok(None) => {
            warn!("No athan settings stored, playing with defaults");
            SessionRequest::fallback(&signal)
        }
        Err(e) => {
            error!("Failed to load athan settings ({}), playing with defaults", e);
            SessionRequest::fallback(&signal)
        }
    };

    state.athan.start(request);
}

/// Start-up scheduling flow, also re-run after each midnight. Seeds
/// default settings, then arms today's alarms and the countdown.
pub async fn on_boot_completed(state: &AppState) {
    info!("Running startup scheduling flow");

    match state.db.init_default_athan_settings().await {
        Ok(true) => info!("Seeded default athan settings"),
        Ok(false) => {}
        Err(e) => error!("Failed to seed athan settings: {}", e),
    }

    let enabled = match state.db.get_athan_settings().await {
        Ok(Some(settings)) => settings.enabled,
        Ok(None) => true,
        Err(e) => {
            error!("Failed to load athan settings ({}), assuming enabled", e);
            true
        }
    };

    if !enabled {
        info!("Athan is disabled, skipping alarm scheduling");
        return;
    }

    match schedule_today(state).await {
        Ok(Some(armed)) => info!("Startup scheduling complete, {} alarms armed", armed),
        Ok(None) => {}
        Err(e) => error!("Startup scheduling failed: {}", e),
    }
}

/// Arms today's alarms and starts the countdown when a record for today
/// exists. Returns None when the store has nothing to work with.
async fn schedule_today(state: &AppState) -> AppResult<Option<usize>> {
    if !state.db.has_prayer_data().await? {
        warn!("No prayer times stored yet, nothing to schedule");
        return Ok(None);
    }

    let today = today_key();
    match state.db.get_prayer_day(&today).await? {
        Some(day) => {
            let armed = state.scheduler.schedule_all_prayer_alarms(&day);
            state.countdown.start();
            Ok(Some(armed))
        }
        None => {
            warn!("No prayer times stored for {}", today);
            Ok(None)
        }
    }
}

/// Re-runs the startup scheduling flow shortly after each local midnight
/// so a long-running daemon keeps covering the new day.
pub fn spawn_daily_reschedule(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting daily reschedule loop");
        loop {
            let wait = until_next_reschedule(Local::now());
            tokio::select! {
                _ = sleep(wait) => {}
                _ = state.shutdown.cancelled() => {
                    info!("Daily reschedule loop received shutdown signal, stopping gracefully");
                    break;
                }
            }

            info!("Past midnight, rescheduling for the new day");
            on_boot_completed(&state).await;
        }
    })
}

/// Duration until five past the next local midnight.
fn until_next_reschedule(now: DateTime<Local>) -> Duration {
    let fallback = Duration::from_secs(24 * 60 * 60);
    let Some(next) = (now.date_naive() + chrono::Duration::days(1)).and_hms_opt(0, 5, 0) else {
        return fallback;
    };
    match Local.from_local_datetime(&next).earliest() {
        Some(target) => Duration::from_millis((target - now).num_milliseconds().max(0) as u64),
        None => fallback,
    }
}
