// file: src/models/settings.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Athan playback preferences. Stored as a singleton row; a missing row
/// means the user never touched the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AthanSettings {
    pub enabled: bool,
    pub volume: f32,                       // 0.0 to 1.0
    pub custom_sound_path: Option<String>, // None = bundled default athan
}

impl Default for AthanSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 1.0,
            custom_sound_path: None,
        }
    }
}

impl AthanSettings {
    /// Volume as the playback layer consumes it, forced into [0.0, 1.0].
    pub fn clamped_volume(&self) -> f32 {
        self.volume.clamp(0.0, 1.0)
    }
}
