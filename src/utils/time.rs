use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use crate::error::{AppError, AppResult};

/// Parses a stored prayer time into a `NaiveTime`.
///
/// Upstream providers write 12-hour clock strings like "5:30 AM"; some
/// sources emit 24-hour "17:30" instead, so both are accepted.
pub fn parse_display_time(value: &str) -> AppResult<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| AppError::invalid_time(format!("unparseable clock time '{}'", value)))
}

/// Renders a time back into the 12-hour display form, e.g. "5:30 AM".
pub fn format_display_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Minutes elapsed since local midnight, the unit the countdown math
/// compares prayers in.
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// Anchors a wall-clock time onto a calendar date in the local zone.
/// DST gaps make some local datetimes unrepresentable; those come back
/// as `None` and callers treat the prayer as unschedulable.
pub fn local_datetime(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&date.and_time(time)).earliest()
}

/// Store key for a calendar date, `YYYY-MM-DD`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today_key() -> String {
    date_key(Local::now().date_naive())
}
