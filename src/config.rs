//! Application configuration module
//!
//! Centralizes filesystem locations, playback limits and scheduling
//! switches for the daemon. Values come from built-in defaults with
//! environment overrides; nothing here touches the database.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::info;

use crate::error::{AppError, AppResult};

/// Runtime configuration for the daemon
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// sqlx connection string for the prayer time store
    pub database_url: String,
    /// Directory searched for bundled athan recordings
    pub sounds_dir: PathBuf,
    /// Default athan recording, used when no custom sound is configured
    pub default_athan_sound: Option<PathBuf>,
    /// Refresh cadence of the countdown notification
    pub countdown_refresh: Duration,
    /// Hard ceiling on how long a playback session may hold the wake lock
    pub wake_lock_cap: Duration,
    /// Whether exact-time wake-ups may be registered at all
    pub exact_alarms_allowed: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        let sounds_dir = data_dir.join("sounds");
        Self {
            database_url: format!(
                "sqlite:{}?mode=rwc",
                data_dir.join("openathan.db").display()
            ),
            default_athan_sound: Some(sounds_dir.join("athan.mp3")),
            sounds_dir,
            countdown_refresh: Duration::from_secs(60),
            wake_lock_cap: Duration::from_secs(10 * 60),
            exact_alarms_allowed: true,
        }
    }
}

impl AppConfig {
    /// Create the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with environment overrides applied
    ///
    /// * `OPENATHAN_DB` - full sqlx connection string
    /// * `OPENATHAN_SOUND` - path to the default athan recording
    /// * `OPENATHAN_EXACT_ALARMS` - "0"/"false" disables exact wake-ups
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("OPENATHAN_DB") {
            config.database_url = url;
        }
        if let Ok(path) = env::var("OPENATHAN_SOUND") {
            config.default_athan_sound = Some(PathBuf::from(path));
        }
        if let Ok(value) = env::var("OPENATHAN_EXACT_ALARMS") {
            config.exact_alarms_allowed = parse_bool_flag(&value);
        }
        config
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(AppError::config(format!(
                "unsupported database url '{}'",
                self.database_url
            )));
        }
        if self.countdown_refresh < Duration::from_secs(1) {
            return Err(AppError::config("countdown refresh below 1s"));
        }
        if self.wake_lock_cap.is_zero() {
            return Err(AppError::config("wake lock cap must be positive"));
        }
        info!(
            "Configuration validated (db: {}, exact alarms: {})",
            self.database_url, self.exact_alarms_allowed
        );
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("openathan")
}

fn parse_bool_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.database_url.starts_with("sqlite:"));
        assert_eq!(config.countdown_refresh, Duration::from_secs(60));
        assert_eq!(config.wake_lock_cap, Duration::from_secs(600));
        assert!(config.exact_alarms_allowed);
    }

    #[test]
    fn test_bool_flag_parsing() {
        assert!(parse_bool_flag("1"));
        assert!(parse_bool_flag("true"));
        assert!(parse_bool_flag("anything"));
        assert!(!parse_bool_flag("0"));
        assert!(!parse_bool_flag("false"));
        assert!(!parse_bool_flag(" FALSE "));
        assert!(!parse_bool_flag("off"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.database_url = "postgres://localhost".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.countdown_refresh = Duration::from_millis(200);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.wake_lock_cap = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
