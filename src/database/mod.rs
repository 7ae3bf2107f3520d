// file: src/database/mod.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Row, Sqlite};
use tokio::sync::watch;

use crate::models::{AthanSettings, PrayerDay};

// Declare submodules
pub mod prayers;
pub mod settings;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        let db_exists = Sqlite::database_exists(database_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database");
            Sqlite::create_database(database_url)
                .await
                .context("Failed to create database")?;
        }

        // Connect to database
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;

        // Run schema migrations
        run_schema(&pool).await.context("Failed to run database schema")?;

        // Ensure specific migrations for existing databases
        ensure_migrations(&pool).await.context("Failed to ensure migrations")?;

        info!("Database initialized successfully");

        let (changes, _) = watch::channel(0u64);
        Ok(Database {
            pool,
            changes: Arc::new(changes),
        })
    }

    /// Change feed for long-lived services: the generation counter bumps
    /// on every write, subscribers re-query whatever they care about.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify_change(&self) {
        self.changes.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    // --- Prayer Time Delegates ---

    pub async fn get_prayer_day(&self, date: &str) -> Result<Option<PrayerDay>> {
        prayers::get_for_date(&self.pool, date).await
    }

    pub async fn add_prayer_day(&self, day: &PrayerDay) -> Result<()> {
        prayers::upsert(&self.pool, day).await?;
        self.notify_change();
        Ok(())
    }

    pub async fn add_prayer_days(&self, days: &[PrayerDay]) -> Result<()> {
        prayers::upsert_many(&self.pool, days).await?;
        self.notify_change();
        Ok(())
    }

    pub async fn delete_prayer_days_before(&self, date: &str) -> Result<u64> {
        let removed = prayers::delete_before(&self.pool, date).await?;
        if removed > 0 {
            self.notify_change();
        }
        Ok(removed)
    }

    pub async fn prayer_day_count(&self) -> Result<i64> {
        prayers::count(&self.pool).await
    }

    pub async fn has_prayer_data(&self) -> Result<bool> {
        prayers::has_any(&self.pool).await
    }

    pub async fn earliest_prayer_date(&self) -> Result<Option<String>> {
        prayers::earliest_date(&self.pool).await
    }

    pub async fn latest_prayer_date(&self) -> Result<Option<String>> {
        prayers::latest_date(&self.pool).await
    }

    // --- Athan Settings Delegates ---

    pub async fn get_athan_settings(&self) -> Result<Option<AthanSettings>> {
        settings::get(&self.pool).await
    }

    pub async fn save_athan_settings(&self, settings: &AthanSettings) -> Result<()> {
        settings::save(&self.pool, settings).await?;
        self.notify_change();
        Ok(())
    }

    pub async fn init_default_athan_settings(&self) -> Result<bool> {
        let inserted = settings::init_defaults(&self.pool).await?;
        if inserted {
            info!("Athan settings initialized with defaults");
            self.notify_change();
        }
        Ok(inserted)
    }

    pub async fn set_athan_enabled(&self, enabled: bool) -> Result<()> {
        settings::set_enabled(&self.pool, enabled).await?;
        self.notify_change();
        Ok(())
    }

    pub async fn set_athan_volume(&self, volume: f32) -> Result<()> {
        settings::set_volume(&self.pool, volume).await?;
        self.notify_change();
        Ok(())
    }

    pub async fn set_custom_athan_path(&self, path: Option<&str>) -> Result<()> {
        settings::set_custom_path(&self.pool, path).await?;
        self.notify_change();
        Ok(())
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    let mut in_trigger = false;

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        if trimmed.to_uppercase().starts_with("CREATE TRIGGER") {
            in_trigger = true;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            if in_trigger {
                if trimmed.to_uppercase() == "END;" {
                    in_trigger = false;
                    sqlx::query(&current_statement).execute(pool).await?;
                    current_statement.clear();
                }
            } else {
                sqlx::query(&current_statement).execute(pool).await?;
                current_statement.clear();
            }
        }
    }
    Ok(())
}

async fn ensure_migrations(pool: &SqlitePool) -> Result<()> {
    // Check columns in prayer_times table
    let rows = sqlx::query("PRAGMA table_info(prayer_times)")
        .fetch_all(pool)
        .await
        .context("Failed to fetch table info")?;

    let columns: Vec<String> = rows
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    if !columns.contains(&"calculation_method".to_string()) {
        info!("Migrating: Adding calculation_method column to prayer_times table");
        sqlx::query("ALTER TABLE prayer_times ADD COLUMN calculation_method TEXT NOT NULL DEFAULT ''")
            .execute(pool)
            .await
            .context("Failed to add calculation_method column")?;
    }

    // Check columns in athan_settings table
    let rows = sqlx::query("PRAGMA table_info(athan_settings)")
        .fetch_all(pool)
        .await
        .context("Failed to fetch table info")?;

    let columns: Vec<String> = rows
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    if !columns.contains(&"custom_sound_path".to_string()) {
        info!("Migrating: Adding custom_sound_path column to athan_settings table");
        sqlx::query("ALTER TABLE athan_settings ADD COLUMN custom_sound_path TEXT")
            .execute(pool)
            .await
            .context("Failed to add custom_sound_path column")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    async fn create_test_database() -> Database {
        let temp_file = NamedTempFile::new().unwrap();
        let (_, path) = temp_file.keep().unwrap();
        let db_path = format!("sqlite:{}", path.to_str().unwrap());

        let pool = SqlitePool::connect(&db_path).await.unwrap();

        // Run schema
        run_schema(&pool).await.unwrap();

        let (changes, _) = watch::channel(0u64);
        Database {
            pool,
            changes: Arc::new(changes),
        }
    }

    fn sample_day(date: &str) -> PrayerDay {
        PrayerDay::new(date, "5:30 AM", "12:15 PM", "3:45 PM", "6:20 PM", "7:45 PM")
    }

    #[tokio::test]
    async fn test_database_new() {
        let db = create_test_database().await;
        assert!(db.pool.is_closed() == false);
    }

    #[tokio::test]
    async fn test_add_and_get_prayer_day() {
        let db = create_test_database().await;
        db.add_prayer_day(&sample_day("2025-06-01")).await.unwrap();

        let day = db.get_prayer_day("2025-06-01").await.unwrap().unwrap();
        assert_eq!(day.date, "2025-06-01");
        assert_eq!(day.fajr, "5:30 AM");
        assert_eq!(day.isha, "7:45 PM");
    }

    #[tokio::test]
    async fn test_get_prayer_day_missing() {
        let db = create_test_database().await;
        let day = db.get_prayer_day("2025-06-01").await.unwrap();
        assert!(day.is_none());
    }

    #[tokio::test]
    async fn test_add_prayer_day_replaces_same_date() {
        let db = create_test_database().await;
        db.add_prayer_day(&sample_day("2025-06-01")).await.unwrap();

        let mut updated = sample_day("2025-06-01");
        updated.fajr = "5:32 AM".to_string();
        db.add_prayer_day(&updated).await.unwrap();

        assert_eq!(db.prayer_day_count().await.unwrap(), 1);
        let day = db.get_prayer_day("2025-06-01").await.unwrap().unwrap();
        assert_eq!(day.fajr, "5:32 AM");
    }

    #[tokio::test]
    async fn test_bulk_insert_and_stats() {
        let db = create_test_database().await;
        let days = vec![
            sample_day("2025-06-01"),
            sample_day("2025-06-02"),
            sample_day("2025-06-03"),
        ];
        db.add_prayer_days(&days).await.unwrap();

        assert_eq!(db.prayer_day_count().await.unwrap(), 3);
        assert!(db.has_prayer_data().await.unwrap());
        assert_eq!(
            db.earliest_prayer_date().await.unwrap(),
            Some("2025-06-01".to_string())
        );
        assert_eq!(
            db.latest_prayer_date().await.unwrap(),
            Some("2025-06-03".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_prayer_days_before() {
        let db = create_test_database().await;
        let days = vec![
            sample_day("2025-06-01"),
            sample_day("2025-06-02"),
            sample_day("2025-06-03"),
        ];
        db.add_prayer_days(&days).await.unwrap();

        let removed = db.delete_prayer_days_before("2025-06-03").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.prayer_day_count().await.unwrap(), 1);
        assert_eq!(
            db.earliest_prayer_date().await.unwrap(),
            Some("2025-06-03".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_store_stats() {
        let db = create_test_database().await;
        assert!(!db.has_prayer_data().await.unwrap());
        assert_eq!(db.earliest_prayer_date().await.unwrap(), None);
        assert_eq!(db.latest_prayer_date().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_athan_settings_absent_by_default() {
        let db = create_test_database().await;
        assert!(db.get_athan_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_init_default_athan_settings_once() {
        let db = create_test_database().await;

        assert!(db.init_default_athan_settings().await.unwrap());
        let settings = db.get_athan_settings().await.unwrap().unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.volume, 1.0);
        assert!(settings.custom_sound_path.is_none());

        // Second init must not overwrite anything
        db.set_athan_volume(0.4).await.unwrap();
        assert!(!db.init_default_athan_settings().await.unwrap());
        let settings = db.get_athan_settings().await.unwrap().unwrap();
        assert_eq!(settings.volume, 0.4);
    }

    #[tokio::test]
    async fn test_save_and_update_athan_settings() {
        let db = create_test_database().await;

        let mut settings = AthanSettings::default();
        settings.volume = 0.5;
        settings.custom_sound_path = Some("/sounds/custom.mp3".to_string());
        db.save_athan_settings(&settings).await.unwrap();

        let stored = db.get_athan_settings().await.unwrap().unwrap();
        assert_eq!(stored.volume, 0.5);
        assert_eq!(
            stored.custom_sound_path.as_deref(),
            Some("/sounds/custom.mp3")
        );

        db.set_athan_enabled(false).await.unwrap();
        db.set_custom_athan_path(None).await.unwrap();
        let stored = db.get_athan_settings().await.unwrap().unwrap();
        assert!(!stored.enabled);
        assert!(stored.custom_sound_path.is_none());
    }

    #[tokio::test]
    async fn test_volume_updates_are_clamped() {
        let db = create_test_database().await;
        db.init_default_athan_settings().await.unwrap();

        db.set_athan_volume(2.5).await.unwrap();
        let settings = db.get_athan_settings().await.unwrap().unwrap();
        assert_eq!(settings.volume, 1.0);

        db.set_athan_volume(-1.0).await.unwrap();
        let settings = db.get_athan_settings().await.unwrap().unwrap();
        assert_eq!(settings.volume, 0.0);
    }

    #[tokio::test]
    async fn test_subscribe_sees_writes() {
        let db = create_test_database().await;
        let mut rx = db.subscribe();
        let before = *rx.borrow();

        db.add_prayer_day(&sample_day("2025-06-01")).await.unwrap();

        rx.changed().await.unwrap();
        assert!(*rx.borrow() > before);
    }
}
