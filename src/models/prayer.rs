// file: src/models/prayer.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The five daily prayers, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }

    /// Stable wake-up registration id. These are fixed so re-scheduling a
    /// prayer replaces its previous registration instead of stacking a new
    /// one next to it.
    pub fn alarm_id(&self) -> i32 {
        match self {
            Prayer::Fajr => 1001,
            Prayer::Dhuhr => 1002,
            Prayer::Asr => 1003,
            Prayer::Maghrib => 1004,
            Prayer::Isha => 1005,
        }
    }

    pub fn from_alarm_id(id: i32) -> Option<Prayer> {
        match id {
            1001 => Some(Prayer::Fajr),
            1002 => Some(Prayer::Dhuhr),
            1003 => Some(Prayer::Asr),
            1004 => Some(Prayer::Maghrib),
            1005 => Some(Prayer::Isha),
            _ => None,
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One day's prayer schedule as stored, times in display form ("5:30 AM").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrayerDay {
    pub date: String, // YYYY-MM-DD
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub calculation_method: String,
    pub created_at: DateTime<Utc>,
}

impl PrayerDay {
    pub fn new(
        date: impl Into<String>,
        fajr: impl Into<String>,
        dhuhr: impl Into<String>,
        asr: impl Into<String>,
        maghrib: impl Into<String>,
        isha: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            fajr: fajr.into(),
            dhuhr: dhuhr.into(),
            asr: asr.into(),
            maghrib: maghrib.into(),
            isha: isha.into(),
            country: String::new(),
            city: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            calculation_method: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn time_of(&self, prayer: Prayer) -> &str {
        match prayer {
            Prayer::Fajr => &self.fajr,
            Prayer::Dhuhr => &self.dhuhr,
            Prayer::Asr => &self.asr,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isha => &self.isha,
        }
    }

    /// All five times paired with their prayer, schedule order.
    pub fn times(&self) -> [(Prayer, &str); 5] {
        Prayer::ALL.map(|prayer| (prayer, self.time_of(prayer)))
    }
}
