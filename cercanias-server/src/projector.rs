//! Staleness projection of the cached schedule into the display grid.
//!
//! The grid always has [`VIEW_CELLS`] cells. Entries that departed more
//! than [`STALENESS_GRACE_MINS`] minutes ago are dropped; the rest fill the
//! grid in source order and empty cells pad the remainder.
//!
//! The cutoff comparison works on "HH:MM" times within a single day and
//! does not wrap at midnight: just after midnight the cutoff lands late on
//! the previous evening, so services early in the new day compare as
//! already gone.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::{ClockTime, ScheduleEntry};

/// Number of cells in the display grid.
pub const VIEW_CELLS: usize = 6;

/// How long after departure an entry stays on the grid.
pub const STALENESS_GRACE_MINS: i64 = 5;

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayCell {
    /// An upcoming (or just-departed) service.
    Departure(ScheduleEntry),
    /// Padding when fewer services remain than cells.
    Empty,
}

impl DisplayCell {
    /// The departure time shown in this cell, blank for padding.
    pub fn label(&self) -> String {
        match self {
            DisplayCell::Departure(entry) => entry.departure_time.to_string(),
            DisplayCell::Empty => String::new(),
        }
    }

    /// Whether this cell is padding.
    pub fn is_empty(&self) -> bool {
        matches!(self, DisplayCell::Empty)
    }
}

/// The fixed-size grid handed to the display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayView {
    cells: [DisplayCell; VIEW_CELLS],
}

impl DisplayView {
    /// All cells, in display order.
    pub fn cells(&self) -> &[DisplayCell; VIEW_CELLS] {
        &self.cells
    }

    /// Departure labels, blank for padding.
    pub fn labels(&self) -> Vec<String> {
        self.cells.iter().map(DisplayCell::label).collect()
    }

    /// Number of cells holding a departure.
    pub fn departure_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

/// The earliest departure still shown at `now`, truncated to the minute.
pub fn staleness_cutoff(now: NaiveDateTime) -> ClockTime {
    let cutoff = now - Duration::minutes(STALENESS_GRACE_MINS);
    ClockTime::from_naive_time(cutoff.time())
}

/// Project the raw schedule into the display grid at `now`.
///
/// Keeps entries departing at or after the cutoff, takes the first
/// [`VIEW_CELLS`] of them in their original order (no sorting), and pads
/// with [`DisplayCell::Empty`].
pub fn project(raw: &[ScheduleEntry], now: NaiveDateTime) -> DisplayView {
    let cutoff = staleness_cutoff(now);

    let mut survivors = raw
        .iter()
        .filter(|entry| entry.departure_time >= cutoff)
        .cloned()
        .map(DisplayCell::Departure);

    let cells = std::array::from_fn(|_| survivors.next().unwrap_or(DisplayCell::Empty));

    DisplayView { cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn entries(times: &[&str]) -> Vec<ScheduleEntry> {
        times
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let dep = ClockTime::parse_hhmm(t).unwrap();
                ScheduleEntry::new(dep, dep, format!("T{i}"))
            })
            .collect()
    }

    #[test]
    fn drops_departed_and_pads() {
        let raw = entries(&["08:00", "08:10", "08:20"]);
        let view = project(&raw, now(8, 7, 0));

        assert_eq!(view.labels(), vec!["08:10", "08:20", "", "", "", ""]);
        assert_eq!(view.departure_count(), 2);
    }

    #[test]
    fn cutoff_is_inclusive_and_truncated() {
        assert_eq!(staleness_cutoff(now(8, 7, 59)).to_string(), "08:02");

        let raw = entries(&["08:01", "08:02", "08:03"]);
        let view = project(&raw, now(8, 7, 59));
        assert_eq!(view.labels()[..2], ["08:02", "08:03"]);
    }

    #[test]
    fn keeps_first_six_in_source_order() {
        let raw = entries(&[
            "09:00", "08:30", "08:40", "08:50", "09:10", "09:20", "09:30", "09:40",
        ]);
        let view = project(&raw, now(8, 0, 0));

        assert_eq!(
            view.labels(),
            vec!["09:00", "08:30", "08:40", "08:50", "09:10", "09:20"]
        );
    }

    #[test]
    fn empty_schedule_is_all_padding() {
        let view = project(&[], now(12, 0, 0));
        assert!(view.cells().iter().all(DisplayCell::is_empty));
    }

    #[test]
    fn everything_departed_is_all_padding() {
        let raw = entries(&["06:00", "07:00"]);
        let view = project(&raw, now(23, 0, 0));
        assert_eq!(view.departure_count(), 0);
    }

    #[test]
    fn early_morning_cutoff_does_not_wrap() {
        // At 00:03 the cutoff is 23:58, so 00:10 compares as departed.
        let raw = entries(&["00:10", "23:59"]);
        let view = project(&raw, now(0, 3, 0));

        assert_eq!(staleness_cutoff(now(0, 3, 0)).to_string(), "23:58");
        assert_eq!(view.labels()[0], "23:59");
        assert_eq!(view.departure_count(), 1);
    }

    #[test]
    fn cells_carry_whole_entries() {
        let raw = vec![ScheduleEntry::new(
            ClockTime::parse_hhmm("08:10").unwrap(),
            ClockTime::parse_hhmm("08:42").unwrap(),
            "36104",
        )];
        let view = project(&raw, now(8, 0, 0));

        match &view.cells()[0] {
            DisplayCell::Departure(entry) => {
                assert_eq!(entry.arrival_time.to_string(), "08:42");
                assert_eq!(entry.train_code, "36104");
            }
            DisplayCell::Empty => panic!("expected a departure"),
        }
    }

    #[test]
    fn serializes_as_tagged_cells() {
        let raw = entries(&["08:10"]);
        let json = serde_json::to_value(project(&raw, now(8, 0, 0))).unwrap();

        assert_eq!(json.as_array().unwrap().len(), VIEW_CELLS);
        assert_eq!(json[0]["kind"], "departure");
        assert_eq!(json[0]["departureTime"], "08:10");
        assert_eq!(json[1]["kind"], "empty");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn arb_entry() -> impl Strategy<Value = ScheduleEntry> {
        (0u8..=29, 0u8..=59).prop_map(|(h, m)| {
            let t = ClockTime::new(h, m).unwrap();
            ScheduleEntry::new(t, t, format!("{h:02}{m:02}"))
        })
    }

    fn arb_now() -> impl Strategy<Value = NaiveDateTime> {
        (0u32..24, 0u32..60, 0u32..60).prop_map(|(h, m, s)| {
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap()
        })
    }

    proptest! {
        /// The grid always has exactly six cells.
        #[test]
        fn always_six_cells(raw in prop::collection::vec(arb_entry(), 0..50), now in arb_now()) {
            let view = project(&raw, now);
            prop_assert_eq!(view.cells().len(), VIEW_CELLS);
            prop_assert_eq!(view.labels().len(), VIEW_CELLS);
        }

        /// Shown departures are never before the cutoff.
        #[test]
        fn nothing_before_cutoff(raw in prop::collection::vec(arb_entry(), 0..50), now in arb_now()) {
            let cutoff = staleness_cutoff(now);
            for cell in project(&raw, now).cells() {
                if let DisplayCell::Departure(entry) = cell {
                    prop_assert!(entry.departure_time >= cutoff);
                }
            }
        }

        /// Departures come first, padding last, and the departures are the
        /// leading survivors in source order.
        #[test]
        fn prefix_of_survivors(raw in prop::collection::vec(arb_entry(), 0..50), now in arb_now()) {
            let cutoff = staleness_cutoff(now);
            let expected: Vec<_> = raw
                .iter()
                .filter(|e| e.departure_time >= cutoff)
                .take(VIEW_CELLS)
                .cloned()
                .collect();

            let view = project(&raw, now);
            let shown: Vec<_> = view
                .cells()
                .iter()
                .filter_map(|c| match c {
                    DisplayCell::Departure(e) => Some(e.clone()),
                    DisplayCell::Empty => None,
                })
                .collect();

            prop_assert_eq!(&shown, &expected);
            prop_assert!(view.cells()[shown.len()..].iter().all(DisplayCell::is_empty));
        }
    }
}
