// OpenAthan Library
// Exposes core functionality for testing and reuse
// Desktop daemon - scheduling, playback, and countdown run in-process

pub mod alarms;
pub mod athan;
pub mod config;
pub mod countdown;
pub mod database;
pub mod error;
pub mod models;
pub mod notify;
pub mod trigger;
pub mod utils;

// Re-export commonly used types
pub use alarms::{AlarmScheduler, AlarmSignal, TokioWakeupRegistry, WakeupRegistry, WakeupTier};
pub use athan::{AthanService, SessionRequest, StopReason};
pub use countdown::CountdownNotifier;
pub use database::Database;
pub use error::AppError;
pub use models::*;
pub use notify::Notifier;

use std::sync::Arc;

/// Application state shared across the application
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub scheduler: Arc<AlarmScheduler>,
    pub athan: AthanService,
    pub countdown: Arc<CountdownNotifier>,
    pub shutdown: tokio_util::sync::CancellationToken,
}
