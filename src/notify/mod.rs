use std::sync::Arc;

use log::{debug, warn};

use crate::error::AppResult;

/// Notification id of the persistent countdown, stable so every refresh
/// replaces the previous one.
pub const COUNTDOWN_NOTIFICATION_ID: u32 = 1001;
/// Notification id of the foreground athan alert.
pub const ATHAN_NOTIFICATION_ID: u32 = 2001;

const APP_NAME: &str = "OpenAthan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

/// What to show, decoupled from how the desktop shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub id: u32,
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
    pub ongoing: bool,
    pub stop_action: bool,
}

impl NotificationContent {
    /// Low-importance sticky countdown card, replaced in place on refresh.
    pub fn countdown(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: COUNTDOWN_NOTIFICATION_ID,
            title: title.into(),
            body: body.into(),
            urgency: Urgency::Low,
            ongoing: true,
            stop_action: false,
        }
    }

    /// High-importance athan alert with the stop action attached.
    pub fn athan(prayer_name: &str) -> Self {
        Self {
            id: ATHAN_NOTIFICATION_ID,
            title: format!("Athan - {}", prayer_name),
            body: format!("It is time for {} prayer", prayer_name),
            urgency: Urgency::Critical,
            ongoing: true,
            stop_action: true,
        }
    }
}

/// Desktop notification surface. Implementations must treat `post` with
/// an already-used id as replacement, not duplication.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn post(&self, content: &NotificationContent) -> AppResult<()>;
    fn clear(&self, id: u32);
}

/// notify-rust backed implementation. Each show happens on its own
/// thread; when the content carries the stop action, that thread stays
/// around waiting for the user to activate it.
pub struct DesktopNotifier {
    on_stop: Arc<dyn Fn() + Send + Sync>,
}

impl DesktopNotifier {
    pub fn new(on_stop: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            on_stop: Arc::new(on_stop),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn post(&self, content: &NotificationContent) -> AppResult<()> {
        let mut notification = notify_rust::Notification::new();
        notification
            .summary(&content.title)
            .body(&content.body)
            .appname(APP_NAME)
            .id(content.id)
            .urgency(match content.urgency {
                Urgency::Low => notify_rust::Urgency::Low,
                Urgency::Normal => notify_rust::Urgency::Normal,
                Urgency::Critical => notify_rust::Urgency::Critical,
            });

        if content.ongoing {
            notification
                .timeout(notify_rust::Timeout::Never)
                .hint(notify_rust::Hint::Resident(true));
        }
        if content.stop_action {
            notification.action("stop", "Stop Athan");
        }

        let wants_stop = content.stop_action;
        let on_stop = Arc::clone(&self.on_stop);
        std::thread::spawn(move || match notification.show() {
            Ok(handle) => {
                #[cfg(all(unix, not(target_os = "macos"), not(target_os = "windows")))]
                if wants_stop {
                    handle.wait_for_action(|action| {
                        if action == "stop" {
                            debug!("Stop action activated from notification");
                            on_stop();
                        }
                    });
                }
                #[cfg(any(target_os = "macos", target_os = "windows"))]
                let _ = (handle, wants_stop, on_stop);
            }
            Err(e) => warn!("Failed to show notification: {}", e),
        });

        Ok(())
    }

    fn clear(&self, id: u32) {
        // The action listener owns the live handle, so closing goes
        // through replacement: post a stub under the same id that
        // expires immediately.
        std::thread::spawn(move || {
            let mut stub = notify_rust::Notification::new();
            stub.appname(APP_NAME)
                .id(id)
                .summary(" ")
                .timeout(notify_rust::Timeout::Milliseconds(1));
            if let Err(e) = stub.show() {
                debug!("Failed to clear notification {}: {}", id, e);
            }
        });
    }
}
