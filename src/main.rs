// OpenAthan - Prayer time alarms for the desktop
// Main entry point for the headless daemon

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use openathan::alarms::TokioWakeupRegistry;
use openathan::athan::{AthanPlayer, AthanService, FocusArbiter, RodioAthanPlayer};
use openathan::config::AppConfig;
use openathan::countdown::CountdownNotifier;
use openathan::database::Database;
use openathan::notify::DesktopNotifier;
use openathan::trigger;
use openathan::utils::logging::init_logging;
use openathan::{AlarmScheduler, AppState, StopReason};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting OpenAthan daemon");

    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let db = match Database::new(&config.database_url).await {
        Ok(database) => Arc::new(database),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            eprintln!("Failed to initialize database: {}", e);
            eprintln!("Please check your system and try again.");
            std::process::exit(1);
        }
    };

    let player: Arc<dyn AthanPlayer> = match rodio::OutputStream::try_default() {
        Ok(_) => Arc::new(RodioAthanPlayer::new()),
        Err(e) => {
            warn!("Failed to initialize audio system: {}", e);
            warn!("Continuing without audio - athan playback will be silent");
            Arc::new(RodioAthanPlayer::new_dummy())
        }
    };

    // Stop requests arrive from the notification action and from SIGUSR1;
    // both land on the same channel.
    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();
    let notifier = {
        let stop_tx = stop_tx.clone();
        Arc::new(DesktopNotifier::new(move || {
            let _ = stop_tx.send(());
        }))
    };

    #[cfg(unix)]
    {
        let stop_tx = stop_tx.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut usr1 = match signal(SignalKind::user_defined1()) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to install SIGUSR1 handler: {}", e);
                    return;
                }
            };
            while usr1.recv().await.is_some() {
                let _ = stop_tx.send(());
            }
        });
    }

    let (registry, mut fire_rx) = TokioWakeupRegistry::new(config.exact_alarms_allowed);
    let athan = AthanService::new(
        player,
        FocusArbiter::new(),
        notifier.clone(),
        config.default_athan_sound.clone(),
        config.wake_lock_cap,
    );

    let shutdown = CancellationToken::new();
    let countdown = Arc::new(CountdownNotifier::new(
        db.clone(),
        notifier.clone(),
        config.countdown_refresh,
        shutdown.clone(),
    ));

    let state = Arc::new(AppState {
        db,
        scheduler: Arc::new(AlarmScheduler::new(Arc::new(registry))),
        athan,
        countdown,
        shutdown,
    });

    trigger::on_boot_completed(&state).await;
    let reschedule = trigger::spawn_daily_reschedule(state.clone());

    info!("OpenAthan daemon running");

    loop {
        tokio::select! {
            Some(signal) = fire_rx.recv() => {
                let state = state.clone();
                tokio::spawn(async move {
                    trigger::on_alarm_fired(&state, signal).await;
                });
            }
            Some(_) = stop_rx.recv() => {
                info!("External stop requested");
                state.athan.request_stop(StopReason::StopAction);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    state.shutdown.cancel();
    state.scheduler.cancel_all_prayer_alarms();
    state.countdown.stop();
    state.athan.request_stop(StopReason::StopAction);
    reschedule.abort();

    info!("OpenAthan stopped");
    Ok(())
}
