//! Route swaps.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{CacheError, CacheRecord, ScheduleCache};
use crate::domain::Route;
use crate::events::{DisplayEvent, Notifier};
use crate::refresh::{RefreshTrigger, TriggerReason};

/// Errors from a swap request.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// Nothing to swap; the cache was not touched.
    #[error("no route configured")]
    NoRoute,

    /// The swapped route could not be saved.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// The record after swapping `current`'s route, or `None` if it has none.
///
/// The old schedule and fetch time are carried over so the display keeps
/// showing something until the refresh for the new direction lands.
pub fn swap_record(current: &CacheRecord) -> Option<CacheRecord> {
    let route = current.route.as_ref()?.swapped();
    Some(CacheRecord {
        route: Some(route),
        raw_schedule: current.raw_schedule.clone(),
        last_fetched_at: current.last_fetched_at,
    })
}

/// Applies route changes requested from the display surface.
#[derive(Clone)]
pub struct RouteController {
    cache: Arc<ScheduleCache>,
    trigger: Arc<dyn RefreshTrigger>,
    notifier: Notifier,
}

impl RouteController {
    pub fn new(
        cache: Arc<ScheduleCache>,
        trigger: Arc<dyn RefreshTrigger>,
        notifier: Notifier,
    ) -> Self {
        Self {
            cache,
            trigger,
            notifier,
        }
    }

    /// Reverse the active route.
    ///
    /// Saves the swapped route, starts a refresh for it, then tells the
    /// display. With no route configured this logs a warning and returns
    /// [`SwapError::NoRoute`].
    pub async fn swap(&self) -> Result<Route, SwapError> {
        let Some(record) = self.cache.update(swap_record).await? else {
            warn!("swap requested with no route configured");
            return Err(SwapError::NoRoute);
        };

        let Some(route) = record.route else {
            return Err(SwapError::NoRoute);
        };

        info!(%route, "route swapped");

        let outcome = self.trigger.trigger(TriggerReason::RouteSwap);
        info!(?outcome, "refresh requested after swap");

        self.notifier.notify(DisplayEvent::RouteChanged {
            route: route.clone(),
        });

        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Local;

    use super::*;
    use crate::domain::{ClockTime, ScheduleEntry};
    use crate::refresh::{RefreshState, TriggerOutcome};

    #[derive(Default)]
    struct RecordingTrigger {
        reasons: Mutex<Vec<TriggerReason>>,
    }

    impl RefreshTrigger for RecordingTrigger {
        fn trigger(&self, reason: TriggerReason) -> TriggerOutcome {
            self.reasons.lock().unwrap().push(reason);
            TriggerOutcome::Started
        }

        fn state(&self) -> RefreshState {
            RefreshState::Idle
        }
    }

    fn route() -> Route {
        Route::new("Alacant Terminal", "Elx Parc").unwrap()
    }

    fn setup() -> (
        RouteController,
        Arc<ScheduleCache>,
        Arc<RecordingTrigger>,
        Notifier,
    ) {
        let cache = Arc::new(ScheduleCache::in_memory());
        let trigger = Arc::new(RecordingTrigger::default());
        let notifier = Notifier::new();
        let controller = RouteController::new(cache.clone(), trigger.clone(), notifier.clone());
        (controller, cache, trigger, notifier)
    }

    #[test]
    fn swap_record_carries_schedule_forward() {
        let t = ClockTime::parse_hhmm("08:00").unwrap();
        let current = CacheRecord::fetched(
            route(),
            vec![ScheduleEntry::new(t, t, "36104")],
            Local::now(),
        );

        let swapped = swap_record(&current).unwrap();

        assert_eq!(swapped.route, Some(route().swapped()));
        assert_eq!(swapped.raw_schedule, current.raw_schedule);
        assert_eq!(swapped.last_fetched_at, current.last_fetched_at);
    }

    #[test]
    fn swap_record_without_route() {
        assert!(swap_record(&CacheRecord::default()).is_none());
    }

    #[tokio::test]
    async fn swap_saves_triggers_and_notifies() {
        let (controller, cache, trigger, notifier) = setup();
        let mut events = notifier.subscribe();
        cache.configure_route(route()).await.unwrap();

        let swapped = controller.swap().await.unwrap();

        assert_eq!(swapped.origin(), "Elx Parc");
        assert_eq!(swapped.destination(), "Alacant Terminal");
        assert_eq!(cache.current_route().await, Some(swapped.clone()));
        assert_eq!(
            *trigger.reasons.lock().unwrap(),
            vec![TriggerReason::RouteSwap]
        );
        assert_eq!(
            events.recv().await.unwrap(),
            DisplayEvent::RouteChanged { route: swapped }
        );
    }

    #[tokio::test]
    async fn swapping_twice_restores_route() {
        let (controller, cache, _, _) = setup();
        cache.configure_route(route()).await.unwrap();

        controller.swap().await.unwrap();
        controller.swap().await.unwrap();

        assert_eq!(cache.current_route().await, Some(route()));
    }

    #[tokio::test]
    async fn swap_without_route_is_noop() {
        let (controller, cache, trigger, notifier) = setup();
        let mut events = notifier.subscribe();

        let result = controller.swap().await;

        assert!(matches!(result, Err(SwapError::NoRoute)));
        assert_eq!(cache.snapshot().await, CacheRecord::default());
        assert!(trigger.reasons.lock().unwrap().is_empty());
        assert!(events.try_recv().is_err());
    }
}
