//! Background refresh of the cached schedule.
//!
//! [`RefreshScheduler`] owns the fetch-retry-commit cycle. It runs on a
//! fixed interval and on demand; at most one cycle is in flight.

mod config;
mod scheduler;

pub use config::RefreshConfig;
pub use scheduler::{
    CycleOutcome, RefreshScheduler, RefreshState, RefreshTrigger, ScheduleSource, TriggerOutcome,
    TriggerReason,
};
