//! Row types for the star schema.
//!
//! Timestamps are carried as epoch milliseconds (UTC). Calendar fields on
//! [`TimeRecord`] are derived from `start_time` in `transform` and are a pure
//! function of it.

use serde::Deserialize;

/// Subscription plan of a user. Anything outside free/paid is malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Level::Free),
            "paid" => Some(Level::Paid),
            _ => None,
        }
    }
}

/// Gender as reported by the app. Unrecognized values bucket to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    M,
    F,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "M" => Gender::M,
            "F" => Gender::F,
            _ => Gender::Other,
        }
    }
}

/// One row of the `songs` dimension table.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i64,
    pub duration: f64,
}

/// One row of the `artists` dimension table.
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One row of the `time` dimension table. Weekday is 0 = Monday through
/// 6 = Sunday; week is the ISO week number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRecord {
    pub start_time: i64,
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

/// One row of the `users` dimension table.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub level: Level,
}
