//! Domain types for the schedule refresher.
//!
//! All types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod entry;
mod route;
mod station;
mod time;

pub use entry::{RawSchedule, ScheduleEntry};
pub use route::{InvalidRoute, Route, route_label};
pub use station::{InvalidStationCode, StationCode};
pub use time::{ClockTime, InvalidTime};
