//! Notifications sent to the display surface.
//!
//! Events are only sent after the cache change they describe is committed,
//! so a receiver that re-reads the cache always sees the new data.

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::Route;

/// Buffered events per subscriber before slow receivers start lagging.
const CHANNEL_CAPACITY: usize = 32;

/// How a refresh failure is reported and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Route invalid. Never retried.
    Config,
    /// Network-level failure. Retried once.
    Transport,
    /// Bad status or undecodable body. Retried once.
    Protocol,
    /// The fetched schedule could not be saved.
    Storage,
}

impl FailureKind {
    /// Short message for the display surface.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::Config => "route invalid",
            FailureKind::Transport | FailureKind::Protocol | FailureKind::Storage => {
                "could not refresh, showing cached data"
            }
        }
    }
}

/// Something the display surface should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// A new schedule was committed; re-pull the view.
    DataChanged { fetched_at: Option<DateTime<Local>> },

    /// The route changed; the schedule shown is stale until the next
    /// `DataChanged`.
    RouteChanged { route: Route },

    /// A refresh cycle gave up. The cache is unchanged since `cached_at`.
    RefreshFailed {
        kind: FailureKind,
        message: String,
        cached_at: Option<DateTime<Local>>,
    },
}

impl DisplayEvent {
    /// Event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            DisplayEvent::DataChanged { .. } => "data_changed",
            DisplayEvent::RouteChanged { .. } => "route_changed",
            DisplayEvent::RefreshFailed { .. } => "refresh_failed",
        }
    }
}

/// Fan-out of display events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<DisplayEvent>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Send an event. Having no subscribers is not an error.
    pub fn notify(&self, event: DisplayEvent) {
        trace!(event = event.name(), "display event");
        let _ = self.tx.send(event);
    }

    /// Receive all events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
