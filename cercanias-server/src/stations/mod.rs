//! Station name to carrier code lookup.
//!
//! The directory is fixed at build time and covers the stations the
//! display can be configured for.

mod directory;
mod error;

pub use directory::{Station, StationDirectory};
pub use error::UnknownStation;
