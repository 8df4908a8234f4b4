//! What the display surface sees and can ask for.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime};
use tokio::sync::broadcast;
use tracing::info;

use crate::cache::ScheduleCache;
use crate::controller::{RouteController, SwapError};
use crate::domain::{Route, route_label};
use crate::events::{DisplayEvent, Notifier};
use crate::projector::{DisplayView, project};
use crate::refresh::{RefreshState, RefreshTrigger, TriggerOutcome, TriggerReason};

/// Everything needed to draw the widget once, taken from a single cache
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFrame {
    pub route: Option<Route>,
    pub route_label: String,
    pub view: DisplayView,
    pub last_fetched_at: Option<DateTime<Local>>,
    pub refresh_state: RefreshState,
}

/// Display-facing handle over the cache, the scheduler and the controller.
#[derive(Clone)]
pub struct Widget {
    cache: Arc<ScheduleCache>,
    trigger: Arc<dyn RefreshTrigger>,
    controller: RouteController,
    notifier: Notifier,
}

impl Widget {
    pub fn new(
        cache: Arc<ScheduleCache>,
        trigger: Arc<dyn RefreshTrigger>,
        notifier: Notifier,
    ) -> Self {
        let controller = RouteController::new(cache.clone(), trigger.clone(), notifier.clone());
        Self {
            cache,
            trigger,
            controller,
            notifier,
        }
    }

    /// "origin → destination" for the active route.
    pub async fn route_label(&self) -> String {
        route_label(self.cache.current_route().await.as_ref())
    }

    /// The six-cell view as of now.
    pub async fn display_view(&self) -> DisplayView {
        self.frame().await.view
    }

    /// A frame as of now.
    pub async fn frame(&self) -> WidgetFrame {
        self.frame_at(Local::now().naive_local()).await
    }

    /// A frame as of `now`.
    pub async fn frame_at(&self, now: NaiveDateTime) -> WidgetFrame {
        let record = self.cache.snapshot().await;

        WidgetFrame {
            route_label: route_label(record.route.as_ref()),
            view: project(&record.raw_schedule, now),
            route: record.route,
            last_fetched_at: record.last_fetched_at,
            refresh_state: self.trigger.state(),
        }
    }

    /// Reverse the route and refresh for the new direction.
    pub async fn request_swap(&self) -> Result<Route, SwapError> {
        self.controller.swap().await
    }

    /// Ask for fresh data now.
    pub fn request_manual_refresh(&self) -> TriggerOutcome {
        let outcome = self.trigger.trigger(TriggerReason::Manual);
        info!(?outcome, "manual refresh requested");
        outcome
    }

    /// Display events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.notifier.subscribe()
    }
}
