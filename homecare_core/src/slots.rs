//! Bookable half-hour time slots.
//!
//! The working day runs 09:00 to 19:30 with a lunch gap: no slot starts
//! between 12:30 and 14:00.

use crate::{Error, Result};
use chrono::NaiveTime;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical slot labels, in day order
pub const CANONICAL_SLOTS: [&str; 20] = [
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30",
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
    "18:00", "18:30", "19:00", "19:30",
];

/// A wall-clock time of day in `HH:MM` form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// Parse a label and require it to be one of the canonical slots
    pub fn canonical(label: &str) -> Result<Self> {
        let slot: TimeSlot = label.parse()?;
        if slot.is_canonical() {
            Ok(slot)
        } else {
            Err(Error::Validation(format!(
                "time '{}' is not an available slot (09:00-12:30, 14:00-19:30 every 30 minutes)",
                label.trim()
            )))
        }
    }

    pub fn is_canonical(&self) -> bool {
        let label = self.to_string();
        CANONICAL_SLOTS.contains(&label.as_str())
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

/// All canonical slots in order
pub fn all_slots() -> Vec<TimeSlot> {
    CANONICAL_SLOTS
        .iter()
        .filter_map(|label| label.parse().ok())
        .collect()
}

impl FromStr for TimeSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(TimeSlot)
            .map_err(|_| Error::Validation(format!("invalid time '{}', expected HH:MM", trimmed)))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
