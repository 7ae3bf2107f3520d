// file: src/database/settings.rs
use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::AthanSettings;

/// Fetches the singleton settings row. `None` means the defaults were
/// never persisted, which callers must treat as a normal state.
pub async fn get(pool: &SqlitePool) -> Result<Option<AthanSettings>> {
    let settings = sqlx::query_as::<_, AthanSettings>(
        "SELECT enabled, volume, custom_sound_path FROM athan_settings WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(settings)
}

pub async fn save(pool: &SqlitePool, settings: &AthanSettings) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO athan_settings (id, enabled, volume, custom_sound_path)
        VALUES (1, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            enabled = excluded.enabled,
            volume = excluded.volume,
            custom_sound_path = excluded.custom_sound_path
        "#,
    )
    .bind(settings.enabled)
    .bind(settings.clamped_volume())
    .bind(&settings.custom_sound_path)
    .execute(pool)
    .await?;

    Ok(())
}

/// Writes the default row only when none exists yet. Returns true when
/// the insert actually happened.
pub async fn init_defaults(pool: &SqlitePool) -> Result<bool> {
    let defaults = AthanSettings::default();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO athan_settings (id, enabled, volume, custom_sound_path) VALUES (1, ?, ?, ?)",
    )
    .bind(defaults.enabled)
    .bind(defaults.volume)
    .bind(&defaults.custom_sound_path)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn set_enabled(pool: &SqlitePool, enabled: bool) -> Result<()> {
    sqlx::query("UPDATE athan_settings SET enabled = ? WHERE id = 1")
        .bind(enabled)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_volume(pool: &SqlitePool, volume: f32) -> Result<()> {
    sqlx::query("UPDATE athan_settings SET volume = ? WHERE id = 1")
        .bind(volume.clamp(0.0, 1.0))
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_custom_path(pool: &SqlitePool, path: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE athan_settings SET custom_sound_path = ? WHERE id = 1")
        .bind(path)
        .execute(pool)
        .await?;

    Ok(())
}
