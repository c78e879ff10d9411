//! Core types for seasonal temperature anomaly detection
//! this crate contains the shared data structures used across all components.
pub mod parser;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::IngestError;

// SEASON //

/// Meteorological season, ordered as it appears in a calendar year
/// starting from December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    /// Month (1-12) to season. This is the only place the calendar mapping
    /// lives; historical rows without a label and live readings both go
    /// through it.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    pub fn from_date<D: Datelike>(date: &D) -> Self {
        Self::from_month(date.month())
    }

    /// Season of the current UTC date
    pub fn current() -> Self {
        Self::from_date(&Utc::now())
    }

    /// Parse a season label (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "winter" => Some(Self::Winter),
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "autumn" | "fall" => Some(Self::Autumn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// RAW OBSERVATION (what the dataset file holds)

/// One row of the historical dataset as read from disk.
/// Column names follow the upload format: `city`, `timestamp`,
/// `temperature` and an optional `season` label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObservation {
    pub city: String,

    pub timestamp: String,

    pub temperature: f64,

    #[serde(default)]
    pub season: Option<String>,
}

// OBSERVATION (after ingestion)

/// A historical temperature reading, immutable once ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub location: String,          // city identifier
    pub timestamp: DateTime<Utc>,  // when the reading was taken
    pub temperature: f64,          // degrees, units as supplied
    pub season: Season,            // label used for grouping
}

impl Observation {
    pub fn new(location: impl Into<String>, timestamp: DateTime<Utc>, temperature: f64, season: Season) -> Self {
        Self {
            location: location.into(),
            timestamp,
            temperature,
            season,
        }
    }

    // build an observation from a raw row; `row` is only used for error reporting.
    // a season label on the row wins over the one derived from the timestamp,
    // which uses the local date the row was recorded on, not the UTC one
    pub fn from_raw(raw: RawObservation, row: usize) -> Result<Self, IngestError> {
        let local = parse_local_timestamp(&raw.timestamp).ok_or_else(|| IngestError::InvalidTimestamp {
            row,
            value: raw.timestamp.clone(),
        })?;

        if !raw.temperature.is_finite() {
            return Err(IngestError::InvalidTemperature { row, value: raw.temperature });
        }

        let season = match raw.season.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(label) => Season::parse(label).ok_or_else(|| IngestError::InvalidSeason {
                row,
                value: label.to_string(),
            })?,
            None => Season::from_date(&local),
        };

        Ok(Self {
            location: raw.city,
            timestamp: local.with_timezone(&Utc),
            temperature: raw.temperature,
            season,
        })
    }
}

/// Stable sort by timestamp; rows sharing a timestamp keep their input order
pub fn sort_by_timestamp(observations: &mut [Observation]) {
    observations.sort_by_key(|o| o.timestamp);
}

/// Parse the timestamp formats seen in uploaded datasets.
/// Plain dates are taken as midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    parse_local_timestamp(s).map(|dt| dt.with_timezone(&Utc))
}

// keeps the offset written in the value; naive formats are read as UTC
fn parse_local_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| utc.from_utc_datetime(&naive))
}

// LIVE READING

/// A single externally observed temperature, judged once against history
/// and never merged back into the historical sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub location: String,
    pub temperature: f64,
    pub observed_season: Season,
}

impl LiveReading {
    pub fn new(location: impl Into<String>, temperature: f64, observed_season: Season) -> Self {
        Self {
            location: location.into(),
            temperature,
            observed_season,
        }
    }

    /// Reading stamped with the season of today's date
    pub fn now(location: impl Into<String>, temperature: f64) -> Self {
        Self::new(location, temperature, Season::current())
    }
}
