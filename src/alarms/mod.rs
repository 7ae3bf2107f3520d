use std::sync::Arc;

use chrono::{DateTime, Local};
use log::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::models::{Prayer, PrayerDay};
use crate::utils::logging;
use crate::utils::time::{local_datetime, parse_display_time};

pub mod registry;

pub use registry::{AlarmSignal, TokioWakeupRegistry, WakeupRegistry, WakeupTier};

/// Reserved id for the diagnostic alarm; outside the 1001..=1005 range
/// the five prayers own.
pub const TEST_ALARM_ID: i32 = 9999;

/// Arms one exact wake-up per prayer for the current day. Stateless
/// between calls; the registry's replace-by-id semantics make
/// re-scheduling idempotent.
pub struct AlarmScheduler {
    registry: Arc<dyn WakeupRegistry>,
}

impl AlarmScheduler {
    pub fn new(registry: Arc<dyn WakeupRegistry>) -> Self {
        Self { registry }
    }

    /// Schedules all five prayers from today's record. Returns how many
    /// wake-ups were actually armed; past-due prayers are skipped, they
    /// never roll over to the next day.
    pub fn schedule_all_prayer_alarms(&self, day: &PrayerDay) -> usize {
        self.schedule_all_prayer_alarms_at(day, Local::now())
    }

    /// Same as `schedule_all_prayer_alarms` but anchored at an explicit
    /// clock reading. The midnight rollover uses this; so do tests.
    pub fn schedule_all_prayer_alarms_at(&self, day: &PrayerDay, now: DateTime<Local>) -> usize {
        if !self.registry.exact_allowed() {
            error!("Exact alarm permission not granted; prayer alarms not scheduled");
            return 0;
        }

        let tier = self.registry.best_tier();
        let mut armed = 0;

        for (prayer, time_str) in day.times() {
            match self.schedule_prayer(prayer, time_str, now, tier) {
                Ok(true) => armed += 1,
                Ok(false) => {}
                // One bad prayer must not take its siblings down with it
                Err(e) => error!("Failed to schedule {}: {}", prayer, e),
            }
        }

        logging::log_scheduler_event(&format!("Armed for {}", day.date), armed);
        armed
    }

    fn schedule_prayer(
        &self,
        prayer: Prayer,
        time_str: &str,
        now: DateTime<Local>,
        tier: WakeupTier,
    ) -> AppResult<bool> {
        let time = parse_display_time(time_str)?;
        let fire_at = local_datetime(now.date_naive(), time).ok_or_else(|| {
            AppError::invalid_time(format!("{} at {} has no local representation", prayer, time_str))
        })?;

        if fire_at <= now {
            debug!("{} at {} already passed; not scheduling", prayer, time_str);
            return Ok(false);
        }

        self.registry.register(
            AlarmSignal::new(prayer.alarm_id(), prayer.name()),
            fire_at,
            tier,
        )?;
        info!("{} alarm armed for {}", prayer, fire_at.format("%-I:%M %p"));
        Ok(true)
    }

    pub fn cancel_all_prayer_alarms(&self) {
        for prayer in Prayer::ALL {
            self.registry.cancel(prayer.alarm_id());
        }
        info!("All prayer alarms cancelled");
    }

    pub fn cancel_prayer_alarm(&self, prayer: Prayer) {
        self.registry.cancel(prayer.alarm_id());
        info!("{} alarm cancelled", prayer);
    }

    /// Arms a short-delay diagnostic alarm that exercises the whole
    /// trigger and playback path.
    pub fn schedule_test_alarm(&self, delay_secs: u64) -> AppResult<()> {
        let fire_at = Local::now() + chrono::Duration::seconds(delay_secs as i64);
        self.registry.register(
            AlarmSignal::new(TEST_ALARM_ID, "Test"),
            fire_at,
            self.registry.best_tier(),
        )?;
        info!("Test alarm armed, fires in {}s", delay_secs);
        Ok(())
    }
}
