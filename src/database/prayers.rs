// file: src/database/prayers.rs
use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::PrayerDay;
use crate::utils::logging;

pub async fn get_for_date(pool: &SqlitePool, date: &str) -> Result<Option<PrayerDay>> {
    let day = sqlx::query_as::<_, PrayerDay>(
        r#"
        SELECT
            date, fajr, dhuhr, asr, maghrib, isha,
            country, city, latitude, longitude, calculation_method, created_at
        FROM prayer_times
        WHERE date = ?
        "#,
    )
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(day)
}

pub async fn upsert(pool: &SqlitePool, day: &PrayerDay) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO prayer_times (
            date, fajr, dhuhr, asr, maghrib, isha,
            country, city, latitude, longitude, calculation_method, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&day.date)
    .bind(&day.fajr)
    .bind(&day.dhuhr)
    .bind(&day.asr)
    .bind(&day.maghrib)
    .bind(&day.isha)
    .bind(&day.country)
    .bind(&day.city)
    .bind(day.latitude)
    .bind(day.longitude)
    .bind(&day.calculation_method)
    .bind(day.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Bulk insert for the yearly schedule download. One transaction so a
/// failure partway leaves the previous schedule intact.
pub async fn upsert_many(pool: &SqlitePool, days: &[PrayerDay]) -> Result<()> {
    let started = std::time::Instant::now();
    let mut tx = pool.begin().await?;

    for day in days {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO prayer_times (
                date, fajr, dhuhr, asr, maghrib, isha,
                country, city, latitude, longitude, calculation_method, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&day.date)
        .bind(&day.fajr)
        .bind(&day.dhuhr)
        .bind(&day.asr)
        .bind(&day.maghrib)
        .bind(&day.isha)
        .bind(&day.country)
        .bind(&day.city)
        .bind(day.latitude)
        .bind(day.longitude)
        .bind(&day.calculation_method)
        .bind(day.created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    logging::log_database_operation(
        "bulk upsert",
        "prayer_times",
        started.elapsed().as_millis() as u64,
    );
    Ok(())
}

pub async fn delete_before(pool: &SqlitePool, date: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM prayer_times WHERE date < ?")
        .bind(date)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prayer_times")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn has_any(pool: &SqlitePool) -> Result<bool> {
    Ok(count(pool).await? > 0)
}

pub async fn earliest_date(pool: &SqlitePool) -> Result<Option<String>> {
    let date: Option<String> = sqlx::query_scalar("SELECT MIN(date) FROM prayer_times")
        .fetch_one(pool)
        .await?;

    Ok(date)
}

pub async fn latest_date(pool: &SqlitePool) -> Result<Option<String>> {
    let date: Option<String> = sqlx::query_scalar("SELECT MAX(date) FROM prayer_times")
        .fetch_one(pool)
        .await?;

    Ok(date)
}
