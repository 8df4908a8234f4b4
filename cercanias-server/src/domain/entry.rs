//! Timetable entries.

use serde::{Deserialize, Serialize};

use super::ClockTime;

/// One service from the timetable, as persisted and displayed.
///
/// Serializes with the field names the display layer reads:
/// `departureTime`, `arrivalTime`, `trainCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub departure_time: ClockTime,
    pub arrival_time: ClockTime,
    pub train_code: String,
}

impl ScheduleEntry {
    pub fn new(
        departure_time: ClockTime,
        arrival_time: ClockTime,
        train_code: impl Into<String>,
    ) -> Self {
        Self {
            departure_time,
            arrival_time,
            train_code: train_code.into(),
        }
    }
}

/// The as-fetched timetable, in the order the source returned it.
pub type RawSchedule = Vec<ScheduleEntry>;
