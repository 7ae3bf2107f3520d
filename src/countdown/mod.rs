pub mod schedule;

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use log::{debug, error, info};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::database::Database;
use crate::notify::{NotificationContent, Notifier, COUNTDOWN_NOTIFICATION_ID};
use crate::utils::time::date_key;
use schedule::{format_countdown, next_prayer, CountdownStatus};

/// Keeps the sticky countdown notification current. One refresh loop
/// runs at a time; starting again replaces the previous loop.
pub struct CountdownNotifier {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
    refresh: Duration,
    shutdown: CancellationToken,
    active: Mutex<Option<CancellationToken>>,
}

impl CountdownNotifier {
    pub fn new(
        db: Arc<Database>,
        notifier: Arc<dyn Notifier>,
        refresh: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            db,
            notifier,
            refresh,
            shutdown,
            active: Mutex::new(None),
        }
    }

    /// Starts the refresh loop, cancelling any loop already running.
    pub fn start(&self) {
        let mut active = self.active.lock().unwrap();
        if let Some(previous) = active.take() {
            previous.cancel();
        }

        let token = self.shutdown.child_token();
        *active = Some(token.clone());

        let db = self.db.clone();
        let notifier = self.notifier.clone();
        let refresh = self.refresh;
        tokio::spawn(async move {
            run_countdown_loop(db, notifier, refresh, token).await;
        });
    }

    pub fn stop(&self) {
        let mut active = self.active.lock().unwrap();
        if let Some(token) = active.take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        let active = self.active.lock().unwrap();
        active.as_ref().is_some_and(|token| !token.is_cancelled())
    }
}

async fn run_countdown_loop(
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
    refresh: Duration,
    token: CancellationToken,
) {
    info!("Starting prayer countdown loop");
    let mut changes = db.subscribe();

    loop {
        if token.is_cancelled() {
            info!("Countdown loop received shutdown signal, stopping gracefully");
            break;
        }

        match refresh_cycle(&db, notifier.as_ref()).await {
            Ok(_) => debug!("Countdown refresh completed"),
            Err(e) => error!("Error refreshing countdown: {}", e),
        }

        tokio::select! {
            _ = sleep(refresh) => {}
            changed = changes.changed() => {
                if changed.is_err() {
                    // Sender lives inside Database; fall back to timed polling
                    sleep(refresh).await;
                } else {
                    debug!("Store changed, refreshing countdown");
                }
            }
            _ = token.cancelled() => {
                info!("Countdown loop received shutdown signal during wait, stopping gracefully");
                break;
            }
        }
    }

    notifier.clear(COUNTDOWN_NOTIFICATION_ID);
    info!("Prayer countdown loop stopped");
}

async fn refresh_cycle(
    db: &Database,
    notifier: &dyn Notifier,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let now = Local::now();
    let today = db.get_prayer_day(&date_key(now.date_naive())).await?;
    let tomorrow = db
        .get_prayer_day(&date_key(now.date_naive() + chrono::Duration::days(1)))
        .await?;

    let status = next_prayer(today.as_ref(), tomorrow.as_ref(), now);
    notifier.post(&render_status(&status))?;
    Ok(())
}

fn render_status(status: &CountdownStatus) -> NotificationContent {
    match status {
        CountdownStatus::Upcoming(next) => {
            let day_word = if next.says_today { "today" } else { "tomorrow" };
            let title = format!("Next: {} {} at {}", next.prayer, day_word, next.time_display);
            let label = format_countdown(next.seconds_until);
            let body = if label == "Soon" {
                label
            } else {
                format!("{} remaining", label)
            };
            NotificationContent::countdown(title, body)
        }
        CountdownStatus::ScheduleUnavailable => {
            NotificationContent::countdown("Prayer Times", "Prayer schedule not available")
        }
        CountdownStatus::TomorrowUnavailable => {
            NotificationContent::countdown("Prayer Times", "Next prayer time unavailable")
        }
    }
}
