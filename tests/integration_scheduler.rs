use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use tokio::time::timeout;

use openathan::alarms::TEST_ALARM_ID;
use openathan::{AlarmScheduler, Prayer, PrayerDay, TokioWakeupRegistry, WakeupRegistry};

fn fixed_now() -> DateTime<Local> {
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let time = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
    Local.from_local_datetime(&date.and_time(time)).unwrap()
}

fn standard_day() -> PrayerDay {
    PrayerDay::new(
        "2025-06-01",
        "5:30 AM",
        "12:15 PM",
        "3:45 PM",
        "6:20 PM",
        "7:45 PM",
    )
}

#[tokio::test]
async fn test_afternoon_schedule_arms_remaining_prayers() {
    let (registry, _fire_rx) = TokioWakeupRegistry::new(true);
    let registry = Arc::new(registry);
    let scheduler = AlarmScheduler::new(registry.clone());

    // At 13:00 only Asr, Maghrib, and Isha are still ahead
    let armed = scheduler.schedule_all_prayer_alarms_at(&standard_day(), fixed_now());
    assert_eq!(armed, 3);

    let mut ids = registry.armed_ids();
    ids.sort();
    assert_eq!(ids, vec![1003, 1004, 1005]);
}

#[tokio::test]
async fn test_reschedule_replaces_rather_than_duplicates() {
    let (registry, _fire_rx) = TokioWakeupRegistry::new(true);
    let registry = Arc::new(registry);
    let scheduler = AlarmScheduler::new(registry.clone());

    scheduler.schedule_all_prayer_alarms_at(&standard_day(), fixed_now());
    scheduler.schedule_all_prayer_alarms_at(&standard_day(), fixed_now());

    assert_eq!(registry.armed_ids().len(), 3);
}

#[tokio::test]
async fn test_cancel_all_disarms_everything() {
    let (registry, _fire_rx) = TokioWakeupRegistry::new(true);
    let registry = Arc::new(registry);
    let scheduler = AlarmScheduler::new(registry.clone());

    scheduler.schedule_all_prayer_alarms_at(&standard_day(), fixed_now());
    scheduler.cancel_all_prayer_alarms();

    assert!(registry.armed_ids().is_empty());
}

#[tokio::test]
async fn test_cancel_single_prayer_leaves_the_rest() {
    let (registry, _fire_rx) = TokioWakeupRegistry::new(true);
    let registry = Arc::new(registry);
    let scheduler = AlarmScheduler::new(registry.clone());

    scheduler.schedule_all_prayer_alarms_at(&standard_day(), fixed_now());
    scheduler.cancel_prayer_alarm(Prayer::Maghrib);

    let mut ids = registry.armed_ids();
    ids.sort();
    assert_eq!(ids, vec![1003, 1005]);
}

#[tokio::test]
async fn test_exact_permission_refusal_schedules_nothing() {
    let (registry, _fire_rx) = TokioWakeupRegistry::new(false);
    let registry = Arc::new(registry);
    let scheduler = AlarmScheduler::new(registry.clone());

    let armed = scheduler.schedule_all_prayer_alarms_at(&standard_day(), fixed_now());

    assert_eq!(armed, 0);
    assert!(registry.armed_ids().is_empty());
}

#[tokio::test]
async fn test_test_alarm_fires_through_registry() {
    let (registry, mut fire_rx) = TokioWakeupRegistry::new(true);
    let scheduler = AlarmScheduler::new(Arc::new(registry));

    scheduler.schedule_test_alarm(1).unwrap();

    let signal = timeout(Duration::from_secs(3), fire_rx.recv())
        .await
        .expect("test alarm never fired")
        .expect("registry channel closed");
    assert_eq!(signal.alarm_id, TEST_ALARM_ID);
    assert_eq!(signal.prayer_name, "Test");
}
