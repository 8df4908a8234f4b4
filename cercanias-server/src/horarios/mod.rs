//! Renfe Cercanías horarios client.
//!
//! This module provides an HTTP client for the carrier's timetable servlet,
//! which answers a single POST with the day's scheduled services between
//! two stations.
//!
//! Key characteristics of the servlet:
//! - Stations are identified by 5-digit codes within a network (`nucleo`)
//! - Times are "HH:MM" strings; the query window runs to hour 26
//! - A day without services comes back with no `horario` rows, which is
//!   not an error

mod client;
mod convert;
mod error;
mod types;

pub use client::{HorariosClient, HorariosConfig};
pub use convert::ConversionError;
pub use error::FetchError;
pub use types::{HorarioItem, HorariosRequest, HorariosResponse};
