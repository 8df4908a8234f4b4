//! Single-flight refresh cycles and the periodic ticker that drives them.
//!
//! A cycle reads the active route, fetches today's timetable, and commits
//! it to the cache. Failures other than configuration errors get exactly
//! one retry after a fixed delay. Only one cycle runs at a time; triggers
//! that arrive while a cycle is in flight are dropped.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{CommitOutcome, ScheduleCache};
use crate::domain::{RawSchedule, Route};
use crate::events::{DisplayEvent, FailureKind, Notifier};
use crate::horarios::{FetchError, HorariosClient};

use super::config::RefreshConfig;

/// Extra passes a cycle may run after the route changed under it.
const MAX_FOLLOW_UP_PASSES: usize = 1;

/// Where timetables come from.
///
/// This abstraction allows the scheduler to be tested without the network.
pub trait ScheduleSource: Send + Sync + 'static {
    /// Fetch the timetable for `route` on `date`. One attempt, no retry.
    fn fetch(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> impl Future<Output = Result<RawSchedule, FetchError>> + Send;
}

impl ScheduleSource for HorariosClient {
    fn fetch(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> impl Future<Output = Result<RawSchedule, FetchError>> + Send {
        HorariosClient::fetch(self, route, date)
    }
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    Idle,
    Fetching,
    Retrying,
}

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The periodic ticker fired.
    Periodic,
    /// The user asked for fresh data.
    Manual,
    /// The route was swapped.
    RouteSwap,
    /// A fetch finished after the route changed under it.
    RouteChanged,
}

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new cycle started.
    Started,
    /// A cycle was already running; this trigger was dropped.
    Coalesced,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No route configured; nothing fetched.
    NoRoute,
    /// A schedule with `entries` rows was committed.
    Updated { entries: usize },
    /// The cycle gave up; the cache is unchanged.
    Failed { kind: FailureKind },
    /// The route kept changing; the next trigger picks up the latest one.
    Superseded,
}

/// Anything that can start a refresh cycle on request.
pub trait RefreshTrigger: Send + Sync {
    /// Start a cycle in the background unless one is already running.
    fn trigger(&self, reason: TriggerReason) -> TriggerOutcome;

    /// Current scheduler state.
    fn state(&self) -> RefreshState;
}

/// Outcome of a single fetch-and-commit pass.
enum Pass {
    Done(CycleOutcome),
    /// The route changed while fetching; the result was discarded.
    Superseded,
}

struct Inner<S> {
    source: S,
    cache: Arc<ScheduleCache>,
    notifier: Notifier,
    config: RefreshConfig,
    state: Mutex<RefreshState>,
}

/// Returns the scheduler to `Idle` when a claimed cycle ends, even on panic.
struct Claim<'a> {
    state: &'a Mutex<RefreshState>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RefreshState::Idle;
    }
}

/// Drives refresh cycles for the active route.
pub struct RefreshScheduler<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for RefreshScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ScheduleSource> RefreshScheduler<S> {
    /// Create a scheduler over `cache`, notifying through `notifier`.
    pub fn new(
        source: S,
        cache: Arc<ScheduleCache>,
        notifier: Notifier,
        config: RefreshConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                cache,
                notifier,
                config,
                state: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    /// Run a cycle on the current task and wait for it.
    ///
    /// Returns `None` if a cycle was already in flight.
    pub async fn refresh_now(&self, reason: TriggerReason) -> Option<CycleOutcome> {
        if !self.inner.try_claim() {
            debug!(?reason, "refresh already in flight, dropping trigger");
            return None;
        }
        Some(self.inner.run_claimed(reason).await)
    }

    /// Tick every `interval` until `cancel` fires. The first tick is
    /// immediate.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.inner.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.inner.config.interval.as_secs(),
            "refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("refresh scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.trigger(TriggerReason::Periodic);
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) as a background task.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(cancel).await })
    }
}

impl<S: ScheduleSource> RefreshTrigger for RefreshScheduler<S> {
    fn trigger(&self, reason: TriggerReason) -> TriggerOutcome {
        if !self.inner.try_claim() {
            debug!(?reason, "refresh already in flight, dropping trigger");
            return TriggerOutcome::Coalesced;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_claimed(reason).await;
        });

        TriggerOutcome::Started
    }

    fn state(&self) -> RefreshState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ScheduleSource> Inner<S> {
    /// Move from `Idle` to `Fetching`, or report that a cycle is running.
    fn try_claim(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != RefreshState::Idle {
            return false;
        }
        *state = RefreshState::Fetching;
        true
    }

    fn set_state(&self, next: RefreshState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Run a claimed cycle to completion and release the claim.
    async fn run_claimed(&self, reason: TriggerReason) -> CycleOutcome {
        let _claim = Claim { state: &self.state };

        let mut reason = reason;
        let mut follow_ups = 0;
        loop {
            match self.pass(reason).await {
                Pass::Done(outcome) => return outcome,
                Pass::Superseded if follow_ups < MAX_FOLLOW_UP_PASSES => {
                    follow_ups += 1;
                    reason = TriggerReason::RouteChanged;
                }
                Pass::Superseded => {
                    info!(follow_ups, "route still changing, leaving it to the next trigger");
                    return CycleOutcome::Superseded;
                }
            }
        }
    }

    async fn pass(&self, reason: TriggerReason) -> Pass {
        let Some(route) = self.cache.current_route().await else {
            debug!(?reason, "no route configured, skipping refresh");
            return Pass::Done(CycleOutcome::NoRoute);
        };

        info!(?reason, %route, "refreshing schedule");

        let (route, result) = self.fetch_with_retry(route).await;

        match result {
            Ok(raw) => self.commit(&route, raw).await,
            Err(e) => {
                let current = self.cache.current_route().await;
                if current.as_ref() != Some(&route) {
                    info!(fetched = %route, ?current, error = %e, "route changed during failed fetch, refetching");
                    return Pass::Superseded;
                }

                let kind = e.kind();
                if kind == FailureKind::Config {
                    error!(%route, error = %e, "route cannot be fetched");
                } else {
                    warn!(%route, error = %e, "refresh failed after retry");
                }
                self.report_failure(kind).await;
                Pass::Done(CycleOutcome::Failed { kind })
            }
        }
    }

    /// One attempt, plus one more after the retry delay for transient errors.
    ///
    /// The retry fetches whatever route is active by then. Returns the route
    /// the final attempt was made for.
    async fn fetch_with_retry(&self, route: Route) -> (Route, Result<RawSchedule, FetchError>) {
        self.set_state(RefreshState::Fetching);
        let first = self.source.fetch(&route, Local::now().date_naive()).await;

        match first {
            Ok(raw) => (route, Ok(raw)),
            Err(e) if !e.is_retryable() => (route, Err(e)),
            Err(e) => {
                warn!(
                    error = %e,
                    delay_ms = self.config.retry_delay.as_millis() as u64,
                    "fetch failed, retrying once"
                );
                self.set_state(RefreshState::Retrying);
                tokio::time::sleep(self.config.retry_delay).await;

                let Some(current) = self.cache.current_route().await else {
                    return (route, Err(e));
                };
                if current != route {
                    info!(from = %route, to = %current, "route changed before retry");
                }

                self.set_state(RefreshState::Fetching);
                let second = self.source.fetch(&current, Local::now().date_naive()).await;
                (current, second)
            }
        }
    }

    async fn commit(&self, route: &Route, raw: RawSchedule) -> Pass {
        let at = Local::now();
        let entries = raw.len();

        match self.cache.commit_fetch(route, raw, at).await {
            Ok(CommitOutcome::Committed) => {
                if entries == 0 {
                    info!(%route, "no upcoming services");
                } else {
                    info!(%route, entries, "schedule updated");
                }
                self.notifier.notify(DisplayEvent::DataChanged {
                    fetched_at: Some(at),
                });
                Pass::Done(CycleOutcome::Updated { entries })
            }
            Ok(CommitOutcome::RouteChanged { current }) => {
                info!(fetched = %route, ?current, "route changed during fetch, refetching");
                Pass::Superseded
            }
            Err(e) => {
                error!(%route, error = %e, "failed to save schedule");
                self.report_failure(FailureKind::Storage).await;
                Pass::Done(CycleOutcome::Failed {
                    kind: FailureKind::Storage,
                })
            }
        }
    }

    async fn report_failure(&self, kind: FailureKind) {
        let cached_at = self.cache.snapshot().await.last_fetched_at;
        self.notifier.notify(DisplayEvent::RefreshFailed {
            kind,
            message: kind.user_message().to_string(),
            cached_at,
        });
    }
}
