//! Data transfer objects for web responses.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::Route;
use crate::projector::DisplayView;
use crate::refresh::{RefreshState, TriggerOutcome};
use crate::stations::Station;
use crate::widget::WidgetFrame;

/// The current widget contents.
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    /// Active route, absent before one is configured
    pub route: Option<RouteResponse>,

    /// "origin → destination"
    pub label: String,

    /// Exactly six cells
    pub cells: DisplayView,

    /// When the shown schedule was fetched
    pub last_fetched_at: Option<DateTime<Local>>,

    /// Scheduler state
    pub refresh_state: RefreshState,
}

impl From<WidgetFrame> for ViewResponse {
    fn from(frame: WidgetFrame) -> Self {
        Self {
            route: frame.route.as_ref().map(RouteResponse::from),
            label: frame.route_label,
            cells: frame.view,
            last_fetched_at: frame.last_fetched_at,
            refresh_state: frame.refresh_state,
        }
    }
}

/// A route.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub origin: String,
    pub destination: String,
    pub label: String,
}

impl From<&Route> for RouteResponse {
    fn from(route: &Route) -> Self {
        Self {
            origin: route.origin().to_string(),
            destination: route.destination().to_string(),
            label: route.to_string(),
        }
    }
}

/// Result of a manual refresh request.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// False when a refresh was already running and this one was dropped
    pub started: bool,
}

impl From<TriggerOutcome> for RefreshResponse {
    fn from(outcome: TriggerOutcome) -> Self {
        Self {
            started: outcome == TriggerOutcome::Started,
        }
    }
}

/// Known stations.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<Station>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
