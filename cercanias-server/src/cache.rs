//! Persisted store for the active route and its last-known schedule.
//!
//! Exactly one [`CacheRecord`] exists. Every write replaces it whole, under
//! an exclusive lock, so readers see either the old record or the new one
//! and never a mix. The record is written to disk before it becomes visible
//! in memory; a failed write leaves both copies untouched.
//!
//! The on-disk layout is a flat JSON object of string values:
//! `origin`, `destination`, `schedules` (the JSON-encoded schedule) and an
//! optional `lastFetchedAt` (RFC 3339).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{RawSchedule, Route};

/// Errors from cache persistence.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Writing the cache file failed
    #[error("cache write failed: {message}")]
    Write { message: String },

    /// Encoding the record failed
    #[error("cache encode failed: {message}")]
    Encode { message: String },
}

/// The single cached record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheRecord {
    /// Active route, if one has been configured.
    pub route: Option<Route>,
    /// Schedule from the last successful fetch.
    pub raw_schedule: RawSchedule,
    /// When that fetch completed.
    pub last_fetched_at: Option<DateTime<Local>>,
}

impl CacheRecord {
    /// A record holding a freshly fetched schedule.
    pub fn fetched(route: Route, raw_schedule: RawSchedule, at: DateTime<Local>) -> Self {
        Self {
            route: Some(route),
            raw_schedule,
            last_fetched_at: Some(at),
        }
    }

    /// A newly configured route with nothing fetched yet.
    pub fn unfetched(route: Route) -> Self {
        Self {
            route: Some(route),
            raw_schedule: Vec::new(),
            last_fetched_at: None,
        }
    }
}

/// Result of committing a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The fetched schedule is now the cached record.
    Committed,
    /// The route changed while fetching; nothing was written.
    RouteChanged { current: Option<Route> },
}

/// String-valued key/value layout of the cache file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedRecord {
    #[serde(default)]
    origin: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    schedules: String,
    #[serde(
        default,
        rename = "lastFetchedAt",
        skip_serializing_if = "Option::is_none"
    )]
    last_fetched_at: Option<String>,
}

impl PersistedRecord {
    fn from_record(record: &CacheRecord) -> Result<Self, CacheError> {
        let schedules =
            serde_json::to_string(&record.raw_schedule).map_err(|e| CacheError::Encode {
                message: e.to_string(),
            })?;

        let (origin, destination) = match &record.route {
            Some(route) => (route.origin().to_string(), route.destination().to_string()),
            None => (String::new(), String::new()),
        };

        Ok(Self {
            origin,
            destination,
            schedules,
            last_fetched_at: record.last_fetched_at.map(|at| at.to_rfc3339()),
        })
    }

    fn into_record(self) -> CacheRecord {
        let route = Route::from_parts(&self.origin, &self.destination);

        let raw_schedule = if self.schedules.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.schedules).unwrap_or_else(|e| {
                warn!(error = %e, "discarding unreadable cached schedule");
                Vec::new()
            })
        };

        let last_fetched_at = self.last_fetched_at.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|at| at.with_timezone(&Local))
                .map_err(|e| warn!(error = %e, "discarding unreadable fetch time"))
                .ok()
        });

        CacheRecord {
            route,
            raw_schedule,
            last_fetched_at,
        }
    }
}

/// Configuration for the schedule cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
}

impl CacheConfig {
    /// Create a new cache config with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        // Default to a cache file in the current directory
        Self::new("schedule_cache.json")
    }
}

/// Owned store for the single cache record.
pub struct ScheduleCache {
    /// Where the record is persisted; `None` keeps it in memory only.
    path: Option<PathBuf>,
    record: RwLock<CacheRecord>,
}

impl ScheduleCache {
    /// Open the cache file, starting empty if it is missing or unreadable.
    pub fn open(config: &CacheConfig) -> Self {
        let record = load_record(&config.path);
        debug!(path = %config.path.display(), route = ?record.route, entries = record.raw_schedule.len(), "opened schedule cache");

        Self {
            path: Some(config.path.clone()),
            record: RwLock::new(record),
        }
    }

    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            record: RwLock::new(CacheRecord::default()),
        }
    }

    /// The configured route, or `None` before one is set.
    pub async fn current_route(&self) -> Option<Route> {
        self.record.read().await.route.clone()
    }

    /// A consistent copy of the whole record.
    pub async fn snapshot(&self) -> CacheRecord {
        self.record.read().await.clone()
    }

    /// Replace the record.
    ///
    /// Persists first, then publishes; on error the previous record stays.
    pub async fn replace(&self, record: CacheRecord) -> Result<(), CacheError> {
        let mut guard = self.record.write().await;
        self.persist(&record).await?;
        *guard = record;
        Ok(())
    }

    /// Install a new route with an empty schedule.
    pub async fn configure_route(&self, route: Route) -> Result<(), CacheError> {
        self.replace(CacheRecord::unfetched(route)).await
    }

    /// Derive a new record from the current one under the write lock.
    ///
    /// `f` returns `None` to leave the record alone. Returns the record
    /// that was written, if any.
    pub async fn update<F>(&self, f: F) -> Result<Option<CacheRecord>, CacheError>
    where
        F: FnOnce(&CacheRecord) -> Option<CacheRecord>,
    {
        let mut guard = self.record.write().await;

        let Some(record) = f(&guard) else {
            return Ok(None);
        };

        self.persist(&record).await?;
        *guard = record.clone();
        Ok(Some(record))
    }

    /// Commit a fetched schedule if `route` is still the active route.
    ///
    /// The check and the write happen under one lock, so a route change
    /// can never be overwritten by a fetch started before it.
    pub async fn commit_fetch(
        &self,
        route: &Route,
        raw_schedule: RawSchedule,
        at: DateTime<Local>,
    ) -> Result<CommitOutcome, CacheError> {
        let mut guard = self.record.write().await;

        if guard.route.as_ref() != Some(route) {
            return Ok(CommitOutcome::RouteChanged {
                current: guard.route.clone(),
            });
        }

        let record = CacheRecord::fetched(route.clone(), raw_schedule, at);
        self.persist(&record).await?;
        *guard = record;

        Ok(CommitOutcome::Committed)
    }

    /// Get the cache file path, if persistent.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let persisted = PersistedRecord::from_record(record)?;
        let json = serde_json::to_string_pretty(&persisted).map_err(|e| CacheError::Encode {
            message: e.to_string(),
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::Write {
                    message: format!("failed to create cache directory: {e}"),
                })?;
        }

        // Write beside the target and rename so the file is never half-written.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CacheError::Write {
                message: format!("failed to write cache file: {e}"),
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CacheError::Write {
                message: format!("failed to move cache file into place: {e}"),
            })?;

        Ok(())
    }
}

fn load_record(path: &Path) -> CacheRecord {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheRecord::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read schedule cache, starting empty");
            return CacheRecord::default();
        }
    };

    match serde_json::from_str::<PersistedRecord>(&contents) {
        Ok(persisted) => persisted.into_record(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt schedule cache, starting empty");
            CacheRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{ClockTime, ScheduleEntry};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn route(origin: &str, destination: &str) -> Route {
        Route::new(origin, destination).unwrap()
    }

    fn entry(dep: &str, arr: &str, code: &str) -> ScheduleEntry {
        ScheduleEntry::new(
            ClockTime::parse_hhmm(dep).unwrap(),
            ClockTime::parse_hhmm(arr).unwrap(),
            code,
        )
    }

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 15, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[tokio::test]
    async fn starts_empty() {
        let cache = ScheduleCache::in_memory();
        assert!(cache.current_route().await.is_none());
        assert_eq!(cache.snapshot().await, CacheRecord::default());
    }

    #[tokio::test]
    async fn replace_then_snapshot_roundtrips() {
        let cache = ScheduleCache::in_memory();
        let record = CacheRecord::fetched(
            route("Beniel", "Murcia del Carmen"),
            vec![entry("08:00", "08:12", "1"), entry("08:30", "08:42", "2")],
            at(7, 55),
        );

        cache.replace(record.clone()).await.unwrap();

        assert_eq!(cache.snapshot().await, record);
        assert_eq!(cache.current_route().await, record.route);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let config = CacheConfig::new(dir.path().join("cache.json"));

        let record = CacheRecord::fetched(
            route("Elx Parc", "Alacant Terminal"),
            vec![entry("09:05", "09:30", "36120")],
            at(9, 0),
        );

        {
            let cache = ScheduleCache::open(&config);
            cache.replace(record.clone()).await.unwrap();
        }

        let reopened = ScheduleCache::open(&config);
        assert_eq!(reopened.snapshot().await, record);
    }

    #[tokio::test]
    async fn file_uses_string_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ScheduleCache::open(&CacheConfig::new(&path));

        cache
            .replace(CacheRecord::fetched(
                route("Beniel", "Murcia del Carmen"),
                vec![entry("08:00", "08:12", "36104")],
                at(7, 0),
            ))
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["origin"], "Beniel");
        assert_eq!(json["destination"], "Murcia del Carmen");

        let schedules: serde_json::Value =
            serde_json::from_str(json["schedules"].as_str().unwrap()).unwrap();
        assert_eq!(schedules[0]["departureTime"], "08:00");
        assert_eq!(schedules[0]["arrivalTime"], "08:12");
        assert_eq!(schedules[0]["trainCode"], "36104");
        assert!(json["lastFetchedAt"].is_string());
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let cache = ScheduleCache::open(&CacheConfig::new(dir.path().join("absent.json")));
        assert_eq!(cache.snapshot().await, CacheRecord::default());
    }

    #[test]
    fn unreadable_schedules_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{"origin":"Beniel","destination":"Torrellano","schedules":"not json"}"#,
        )
        .unwrap();

        let record = load_record(&path);
        assert_eq!(record.route, Some(route("Beniel", "Torrellano")));
        assert!(record.raw_schedule.is_empty());
        assert!(record.last_fetched_at.is_none());
    }

    #[test]
    fn half_route_loads_as_no_route() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"origin":"Beniel","destination":"","schedules":"[]"}"#).unwrap();

        assert!(load_record(&path).route.is_none());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{{{").unwrap();

        assert_eq!(load_record(&path), CacheRecord::default());
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("cache.json");
        let cache = ScheduleCache::open(&CacheConfig::new(&path));

        cache
            .configure_route(route("Beniel", "Torrellano"))
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_record() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("cache.json");
        let cache = ScheduleCache::open(&CacheConfig::new(&path));
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        let result = cache
            .configure_route(route("Beniel", "Torrellano"))
            .await;

        assert!(result.is_err());
        assert_eq!(cache.snapshot().await, CacheRecord::default());
    }

    #[tokio::test]
    async fn commit_requires_unchanged_route() {
        let cache = ScheduleCache::in_memory();
        let forward = route("Beniel", "Murcia del Carmen");
        cache.configure_route(forward.clone()).await.unwrap();

        // Route swapped while the fetch was in flight.
        cache.configure_route(forward.swapped()).await.unwrap();

        let outcome = cache
            .commit_fetch(&forward, vec![entry("08:00", "08:12", "1")], at(8, 0))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::RouteChanged {
                current: Some(forward.swapped())
            }
        );
        assert!(cache.snapshot().await.raw_schedule.is_empty());
    }

    #[tokio::test]
    async fn update_skips_write_when_declined() {
        let cache = ScheduleCache::in_memory();

        let written = cache.update(|_| None).await.unwrap();
        assert!(written.is_none());

        let r = route("Beniel", "Torrellano");
        let written = cache
            .update(|current| {
                assert!(current.route.is_none());
                Some(CacheRecord::unfetched(r.clone()))
            })
            .await
            .unwrap();
        assert_eq!(written, Some(CacheRecord::unfetched(r.clone())));
        assert_eq!(cache.current_route().await, Some(r));
    }

    #[tokio::test]
    async fn commit_writes_when_route_matches() {
        let cache = ScheduleCache::in_memory();
        let r = route("Beniel", "Murcia del Carmen");
        cache.configure_route(r.clone()).await.unwrap();

        let outcome = cache
            .commit_fetch(&r, vec![entry("08:00", "08:12", "1")], at(8, 0))
            .await
            .unwrap();

        assert_eq!(outcome, CommitOutcome::Committed);
        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.raw_schedule.len(), 1);
        assert_eq!(snapshot.last_fetched_at, Some(at(8, 0)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_see_torn_records() {
        let cache = Arc::new(ScheduleCache::in_memory());
        let forward = route("Beniel", "Murcia del Carmen");
        let backward = forward.swapped();

        // Each route is always paired with its own train code.
        let record_for = |r: &Route| {
            let code = if r.origin() == "Beniel" { "F" } else { "B" };
            CacheRecord::fetched(r.clone(), vec![entry("08:00", "08:12", code)], at(8, 0))
        };

        let writer = {
            let cache = cache.clone();
            let (forward, backward) = (forward.clone(), backward.clone());
            tokio::spawn(async move {
                for i in 0..500 {
                    let r = if i % 2 == 0 { &forward } else { &backward };
                    cache.replace(record_for(r)).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    for _ in 0..500 {
                        let snapshot = cache.snapshot().await;
                        if let Some(r) = &snapshot.route {
                            let expected = if r.origin() == "Beniel" { "F" } else { "B" };
                            assert_eq!(snapshot.raw_schedule[0].train_code, expected);
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
