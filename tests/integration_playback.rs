use std::sync::{Arc, Mutex};
use std::time::Duration;

use openathan::athan::{
    AthanService, FocusArbiter, RodioAthanPlayer, SessionPhase, SessionRequest,
};
use openathan::error::AppResult;
use openathan::notify::{NotificationContent, Notifier, ATHAN_NOTIFICATION_ID};
use openathan::StopReason;

struct RecordingNotifier {
    posted: Mutex<Vec<NotificationContent>>,
    cleared: Mutex<Vec<u32>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            posted: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn post(&self, content: &NotificationContent) -> AppResult<()> {
        self.posted.lock().unwrap().push(content.clone());
        Ok(())
    }

    fn clear(&self, id: u32) {
        self.cleared.lock().unwrap().push(id);
    }
}

fn build_service() -> (AthanService, Arc<RecordingNotifier>, FocusArbiter) {
    let notifier = Arc::new(RecordingNotifier::new());
    let focus = FocusArbiter::new();
    let service = AthanService::new(
        Arc::new(RodioAthanPlayer::new_dummy()),
        focus.clone(),
        notifier.clone(),
        None,
        Duration::from_secs(600),
    );
    (service, notifier, focus)
}

fn request(prayer: &str) -> SessionRequest {
    SessionRequest {
        alarm_id: 1002,
        prayer_name: prayer.to_string(),
        volume: 1.0,
        custom_sound_path: None,
    }
}

#[tokio::test]
async fn test_full_athan_lifecycle() {
    let (service, notifier, _focus) = build_service();

    // 1. Start a session for Dhuhr
    service.start(request("Dhuhr"));
    assert_eq!(service.phase(), SessionPhase::Playing);
    assert_eq!(service.current_prayer(), Some("Dhuhr".to_string()));
    assert!(service.wake_held());

    // 2. The athan card went up with a stop action
    let posted = notifier.posted.lock().unwrap().clone();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].id, ATHAN_NOTIFICATION_ID);
    assert_eq!(posted[0].title, "Athan - Dhuhr");
    assert!(posted[0].stop_action);

    // 3. Stop tears everything down
    service.request_stop(StopReason::StopAction);
    assert_eq!(service.phase(), SessionPhase::Terminated);
    assert!(!service.wake_held());
    assert_eq!(
        notifier.cleared.lock().unwrap().clone(),
        vec![ATHAN_NOTIFICATION_ID]
    );
}

#[tokio::test]
async fn test_concurrent_stops_tear_down_once() {
    let (service, notifier, _focus) = build_service();
    service.start(request("Maghrib"));

    let reasons = [
        StopReason::StopAction,
        StopReason::VolumeKey,
        StopReason::FocusLoss,
        StopReason::PlayerError,
    ];
    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let reason = reasons[i % reasons.len()];
        handles.push(std::thread::spawn(move || {
            service.request_stop(reason);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.phase(), SessionPhase::Terminated);
    assert_eq!(notifier.cleared.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_new_session_replaces_active_one() {
    let (service, notifier, _focus) = build_service();

    service.start(request("Fajr"));
    service.start(request("Dhuhr"));

    assert_eq!(service.phase(), SessionPhase::Playing);
    assert_eq!(service.current_prayer(), Some("Dhuhr".to_string()));
    assert_eq!(notifier.posted.lock().unwrap().len(), 2);
    // The replaced session was torn down on its way out
    assert_eq!(notifier.cleared.lock().unwrap().len(), 1);

    service.request_stop(StopReason::StopAction);
    assert_eq!(notifier.cleared.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_focus_handoff_stops_playback() {
    let (service, _notifier, focus) = build_service();
    service.start(request("Asr"));

    // Another audio client takes the output
    let _grant = focus.request_exclusive();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(service.phase(), SessionPhase::Terminated);
    assert!(!service.wake_held());
}

#[tokio::test]
async fn test_volume_key_stops_only_active_session() {
    let (service, _notifier, _focus) = build_service();

    service.on_media_key(openathan::athan::MediaKey::VolumeDown);
    assert_eq!(service.phase(), SessionPhase::Idle);

    service.start(request("Isha"));
    service.on_media_key(openathan::athan::MediaKey::VolumeDown);
    assert_eq!(service.phase(), SessionPhase::Terminated);
}
