//! Time-bounded cache of the sensor feed
//!
//! One [`FeedCache`] is built per process and shared by every view. It
//! serves the last snapshot while it is younger than the requested maximum
//! age, and otherwise performs exactly one fetch no matter how many callers
//! are waiting for it.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::feed::FeedSnapshot;
use crate::time::Clock;
use crate::{Error, Result};

/// Sensors hidden from every view unless configuration says otherwise
pub const DEFAULT_DENYLIST: &[&str] = &["MOD-00616", "MOD-00628"];

/// Default maximum age of a served snapshot (15 minutes)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_millis(900_000);

const USER_AGENT: &str = concat!("aqdash/", env!("CARGO_PKG_VERSION"));

/// Sensor identifiers excluded from the feed before it is cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    ids: BTreeSet<String>,
}

impl Denylist {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Remove denied sensors; applying twice removes nothing further
    pub fn apply(&self, mut snapshot: FeedSnapshot) -> FeedSnapshot {
        let before = snapshot.sensors.len();
        snapshot.sensors.retain(|s| !self.contains(&s.id));
        let removed = before - snapshot.sensors.len();
        if removed > 0 {
            debug!(removed, "Applied sensor denylist");
        }
        snapshot
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

/// Where snapshots come from
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedSnapshot>;
}

/// Fetches the feed document over HTTP(S)
pub struct HttpFeedSource {
    http_client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        debug!(url = %self.url, "Fetching sensor feed");

        let response = self
            .http_client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| Error::Fetch {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::Fetch {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        FeedSnapshot::from_json(&body)
    }
}

/// Options for [`FeedCache::get`]
#[derive(Debug, Clone, Copy)]
pub struct GetOptions {
    /// Refetch even when the cached snapshot is still fresh
    pub force: bool,
    /// Snapshots younger than this are served without a fetch
    pub max_age: Duration,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            force: false,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl GetOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Default::default()
        }
    }
}

/// The cached snapshot and when it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: Arc<FeedSnapshot>,
    pub fetched_at: DateTime<Utc>,
}

/// Process-wide feed cache
pub struct FeedCache {
    source: Arc<dyn FeedSource>,
    clock: Arc<dyn Clock>,
    denylist: Denylist,
    entry: RwLock<Option<CacheEntry>>,
    /// Held for the duration of a fetch; waiters queue behind it and
    /// find the outcome of the fetch they waited on
    in_flight: Mutex<Option<Result<Arc<FeedSnapshot>>>>,
    /// Bumped on every completed fetch, successful or not
    flights: AtomicU64,
}

impl FeedCache {
    pub fn new(source: Arc<dyn FeedSource>, clock: Arc<dyn Clock>, denylist: Denylist) -> Self {
        Self {
            source,
            clock,
            denylist,
            entry: RwLock::new(None),
            in_flight: Mutex::new(None),
            flights: AtomicU64::new(0),
        }
    }

    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current entry, fresh or not
    pub fn entry(&self) -> Option<CacheEntry> {
        self.entry.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Return a snapshot no older than `options.max_age`, fetching if needed.
    ///
    /// A caller that arrives while a fetch is in flight waits for it and
    /// shares its outcome, failure included. A failed fetch leaves the
    /// previous entry in place; the next call made after it retries.
    pub async fn get(&self, options: GetOptions) -> Result<Arc<FeedSnapshot>> {
        if !options.force {
            if let Some(snapshot) = self.fresh(options.max_age) {
                debug!("Feed cache hit");
                return Ok(snapshot);
            }
        }

        let observed = self.flights.load(Ordering::Acquire);
        let mut last_flight = self.in_flight.lock().await;

        // A fetch completed while we waited for the lock
        if self.flights.load(Ordering::Acquire) != observed {
            match last_flight.as_ref() {
                Some(Ok(snapshot)) => {
                    debug!("Sharing result of concurrent feed fetch");
                    return Ok(Arc::clone(snapshot));
                }
                Some(Err(e)) => {
                    if !options.force {
                        if let Some(snapshot) = self.fresh(options.max_age) {
                            return Ok(snapshot);
                        }
                    }
                    debug!(error = %e, "Sharing failure of concurrent feed fetch");
                    return Err(e.clone());
                }
                None => {}
            }
        }
        if !options.force {
            if let Some(snapshot) = self.fresh(options.max_age) {
                return Ok(snapshot);
            }
        }

        let outcome = match self.source.fetch().await {
            Ok(snapshot) => Ok(self.store(snapshot)),
            Err(e) => {
                warn!(error = %e, "Feed fetch failed; keeping previous snapshot");
                Err(e)
            }
        };

        *last_flight = Some(outcome.clone());
        self.flights.fetch_add(1, Ordering::AcqRel);

        outcome
    }

    /// Drop the cached entry; the next `get` fetches
    pub fn invalidate(&self) {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = None;
        debug!("Feed cache invalidated");
    }

    /// Filter and atomically replace the entry
    fn store(&self, snapshot: FeedSnapshot) -> Arc<FeedSnapshot> {
        let snapshot = Arc::new(self.denylist.apply(snapshot));
        info!(
            sensors = snapshot.sensors.len(),
            quarantined = snapshot.quarantined_sensors,
            "Feed refreshed"
        );

        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            fetched_at: self.clock.now(),
        });
        snapshot
    }

    fn fresh(&self, max_age: Duration) -> Option<Arc<FeedSnapshot>> {
        let entry = self.entry()?;
        let age = self.clock.now() - entry.fetched_at;
        // A max age beyond chrono's range never expires
        let fresh = chrono::Duration::from_std(max_age)
            .map(|max_age| age < max_age)
            .unwrap_or(true);
        fresh.then_some(entry.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(ids: &[&str]) -> FeedSnapshot {
        let sensors: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        FeedSnapshot::from_json(json!({"sensors": sensors}).to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_default_denylist() {
        let denylist = Denylist::default();
        assert!(denylist.contains("MOD-00616"));
        assert!(denylist.contains("MOD-00628"));
        assert!(!denylist.contains("MOD-00001"));
    }

    #[test]
    fn test_denylist_filters_and_is_idempotent() {
        let denylist = Denylist::default();
        let once = denylist.apply(snapshot(&["MOD-00001", "MOD-00616", "MOD-00628", "MOD-00002"]));
        let ids: Vec<_> = once.sensors.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["MOD-00001", "MOD-00002"]);

        let twice = denylist.apply(once.clone());
        assert_eq!(twice.sensors.len(), once.sensors.len());
    }

    #[test]
    fn test_get_options_defaults() {
        let options = GetOptions::default();
        assert!(!options.force);
        assert_eq!(options.max_age, Duration::from_secs(900));
        assert!(GetOptions::forced().force);
    }

    #[test]
    fn test_http_source_builds() {
        let source = HttpFeedSource::new("https://example.invalid/feed.json", Duration::from_secs(5));
        assert!(source.is_ok());
        assert_eq!(source.unwrap().url(), "https://example.invalid/feed.json");
    }
}
