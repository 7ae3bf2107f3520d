use chrono::{DateTime, Local, Timelike};
use log::warn;

use crate::models::{Prayer, PrayerDay};
use crate::utils::time::{format_display_time, minutes_of_day, parse_display_time};

/// The prayer the countdown is ticking towards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextPrayer {
    pub prayer: Prayer,
    pub time_display: String,
    pub seconds_until: i64,
    /// Word the title uses; pre-dawn a prayer from tomorrow's record
    /// still reads "today".
    pub says_today: bool,
    pub from_tomorrow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownStatus {
    Upcoming(NextPrayer),
    /// No record for today at all.
    ScheduleUnavailable,
    /// Today is exhausted and tomorrow's record is absent or unreadable.
    TomorrowUnavailable,
}

/// Walks today's five prayers in schedule order; the first one strictly
/// in the future is next. When all have passed, falls through to
/// tomorrow's Fajr.
pub fn next_prayer(
    today: Option<&PrayerDay>,
    tomorrow: Option<&PrayerDay>,
    now: DateTime<Local>,
) -> CountdownStatus {
    let Some(today) = today else {
        return CountdownStatus::ScheduleUnavailable;
    };

    let now_seconds = i64::from(now.num_seconds_from_midnight());

    for (prayer, time_str) in today.times() {
        match parse_display_time(time_str) {
            Ok(time) => {
                let prayer_seconds = i64::from(minutes_of_day(time)) * 60;
                if prayer_seconds > now_seconds {
                    return CountdownStatus::Upcoming(NextPrayer {
                        prayer,
                        time_display: format_display_time(time),
                        seconds_until: prayer_seconds - now_seconds,
                        says_today: true,
                        from_tomorrow: false,
                    });
                }
            }
            Err(e) => warn!("Skipping {} in countdown: {}", prayer, e),
        }
    }

    let Some(tomorrow) = tomorrow else {
        return CountdownStatus::TomorrowUnavailable;
    };

    match parse_display_time(&tomorrow.fajr) {
        Ok(time) => {
            let fajr_seconds = i64::from(minutes_of_day(time)) * 60;
            let seconds_until = (86_400 - now_seconds) + fajr_seconds;
            // Fixed pre-dawn cutoff; between midnight and 6 AM the
            // upcoming Fajr reads as part of the current day.
            let says_today = now.hour() < 6;
            CountdownStatus::Upcoming(NextPrayer {
                prayer: Prayer::Fajr,
                time_display: format_display_time(time),
                seconds_until,
                says_today,
                from_tomorrow: true,
            })
        }
        Err(e) => {
            warn!("Tomorrow's Fajr is unreadable: {}", e);
            CountdownStatus::TomorrowUnavailable
        }
    }
}

/// "2h 45m" over an hour, "45m" under one, "Soon" under a minute.
pub fn format_countdown(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "Soon".to_string()
    }
}
