//! Cercanías departures widget server.
//!
//! Keeps the timetable for one commuter route fresh in the background and
//! shows the next few departures: "when is my next train home?"

pub mod cache;
pub mod config;
pub mod controller;
pub mod domain;
pub mod events;
pub mod horarios;
pub mod projector;
pub mod refresh;
pub mod stations;
pub mod web;
pub mod widget;
