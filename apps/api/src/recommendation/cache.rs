//! Read-through recommendation cache.
//!
//! Wraps a `CacheStore` with:
//! - typed keys per scope (`jobsMatchingProfile`, `recommendedJobs`, `recommendedJobCount`)
//! - single-flight population: concurrent misses on one key share one load
//! - invalidation fencing: a read takes a `Fence` before it looks at the
//!   profile. A load whose fence predates an eviction never writes its result,
//!   and reads fenced after an eviction never join a load fenced before it.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};

use crate::models::job::RecommendedJob;
use crate::recommendation::error::RecommendationError;
use crate::recommendation::normalizer::MatchKey;
use crate::recommendation::query::{JobPage, PageRequest};
use crate::recommendation::store::{CacheError, CacheStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// Full, unpaged match list per applicant and match key.
    MatchingJobs,
    /// One page of recommendations plus total.
    RecommendedJobs,
    /// Size of the match set per applicant.
    RecommendedJobCount,
}

impl CacheScope {
    pub const ALL: [CacheScope; 3] = [
        CacheScope::MatchingJobs,
        CacheScope::RecommendedJobs,
        CacheScope::RecommendedJobCount,
    ];

    pub fn namespace(self) -> &'static str {
        match self {
            CacheScope::MatchingJobs => "jobsMatchingProfile",
            CacheScope::RecommendedJobs => "recommendedJobs",
            CacheScope::RecommendedJobCount => "recommendedJobCount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    applicant_id: i64,
    key: String,
}

impl CacheKey {
    /// `recommendedJobs:{applicant}:{match digest}:{page}:{size}`
    pub fn recommended_jobs(applicant_id: i64, match_key: &MatchKey, request: PageRequest) -> Self {
        Self {
            applicant_id,
            key: format!(
                "{}:{}:{}:{}:{}",
                CacheScope::RecommendedJobs.namespace(),
                applicant_id,
                match_key.digest(),
                request.page,
                request.size
            ),
        }
    }

    /// `jobsMatchingProfile:{applicant}:{match digest}`
    pub fn matching_jobs(applicant_id: i64, match_key: &MatchKey) -> Self {
        Self {
            applicant_id,
            key: format!(
                "{}:{}:{}",
                CacheScope::MatchingJobs.namespace(),
                applicant_id,
                match_key.digest()
            ),
        }
    }

    /// `recommendedJobCount:{applicant}`
    pub fn recommended_count(applicant_id: i64) -> Self {
        Self {
            applicant_id,
            key: format!(
                "{}:{}",
                CacheScope::RecommendedJobCount.namespace(),
                applicant_id
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Prefix shared by all of one applicant's keys in a digest-bearing scope.
    fn applicant_prefix(scope: CacheScope, applicant_id: i64) -> String {
        format!("{}:{}:", scope.namespace(), applicant_id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// A materialized result as stored in the cache. Entries are always replaced whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchResult {
    Page(JobPage),
    Jobs(Vec<RecommendedJob>),
    Count(u64),
}

// ────────────────────────────────────────────────────────────────────────────
// Invalidation generations
// ────────────────────────────────────────────────────────────────────────────

/// Applicants share this many invalidation counters. Two applicants on the
/// same stripe fence each other, which costs a skipped write, never a stale one.
const GENERATION_STRIPES: usize = 1024;

/// Invalidation state observed at the start of a read. Pass it to
/// `get_or_populate` for the same applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    global: u64,
    stripe: u64,
}

struct Generations {
    global: u64,
    stripes: Vec<u64>,
}

impl Default for Generations {
    fn default() -> Self {
        Self {
            global: 0,
            stripes: vec![0; GENERATION_STRIPES],
        }
    }
}

impl Generations {
    fn stripe_of(applicant_id: i64) -> usize {
        applicant_id.rem_euclid(GENERATION_STRIPES as i64) as usize
    }

    fn current(&self, applicant_id: i64) -> Fence {
        Fence {
            global: self.global,
            stripe: self.stripes[Self::stripe_of(applicant_id)],
        }
    }

    fn bump_applicant(&mut self, applicant_id: i64) {
        self.stripes[Self::stripe_of(applicant_id)] += 1;
    }

    fn bump_global(&mut self) {
        self.global += 1;
    }
}

type Flight = Arc<OnceCell<Result<MatchResult, RecommendationError>>>;
type Flights = Mutex<HashMap<String, Flight>>;

/// Unregisters a flight when its caller finishes or is dropped mid-load.
struct FlightGuard<'a> {
    flights: &'a Flights,
    key: String,
    flight: Flight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        if flights
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.flight))
        {
            flights.remove(&self.key);
        }
    }
}

enum Lookup {
    Hit(MatchResult),
    Miss,
    StoreDown,
}

pub struct RecommendationCache {
    store: Arc<dyn CacheStore>,
    generations: RwLock<Generations>,
    flights: Flights,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            generations: RwLock::new(Generations::default()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of the invalidation state for `applicant_id`. Take it before
    /// reading anything the cached value is derived from.
    pub async fn fence(&self, applicant_id: i64) -> Fence {
        self.generations.read().await.current(applicant_id)
    }

    /// Cached value for `key`. Undecodable entries read as a miss.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<MatchResult>, CacheError> {
        let Some(raw) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, "discarding undecodable cache entry: {e}");
                Ok(None)
            }
        }
    }

    pub async fn set(
        &self,
        key: &CacheKey,
        value: &MatchResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        self.store.set(key.as_str(), payload, ttl).await
    }

    /// Deletes exactly `keys`.
    pub async fn evict(&self, keys: &[CacheKey]) -> Result<u64, CacheError> {
        let mut generations = self.generations.write().await;
        for key in keys {
            generations.bump_applicant(key.applicant_id);
        }
        let raw: Vec<String> = keys.iter().map(|k| k.key.clone()).collect();
        self.store.delete(&raw).await
    }

    /// Deletes every `jobsMatchingProfile` and `recommendedJobs` entry of
    /// `applicant_id`, whatever match digest or page they were stored under.
    pub async fn evict_applicant(&self, applicant_id: i64) -> Result<u64, CacheError> {
        let mut generations = self.generations.write().await;
        generations.bump_applicant(applicant_id);

        let mut removed = 0;
        for scope in [CacheScope::MatchingJobs, CacheScope::RecommendedJobs] {
            removed += self
                .store
                .delete_prefix(&CacheKey::applicant_prefix(scope, applicant_id))
                .await?;
        }
        Ok(removed)
    }

    /// Deletes every entry in `scope`, for all applicants.
    pub async fn evict_all(&self, scope: CacheScope) -> Result<u64, CacheError> {
        let mut generations = self.generations.write().await;
        generations.bump_global();
        self.store
            .delete_prefix(&format!("{}:", scope.namespace()))
            .await
    }

    /// Returns the cached value for `key`, or runs `load` once for all
    /// concurrent callers of the same key and fence, and caches its result for
    /// the returned TTL unless an eviction has passed `fence` by then.
    ///
    /// When the store cannot be read the load still runs, but its result is not written back.
    pub async fn get_or_populate<F, Fut>(
        &self,
        key: &CacheKey,
        fence: Fence,
        load: F,
    ) -> Result<MatchResult, RecommendationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(MatchResult, Duration), RecommendationError>>,
    {
        let store_healthy = match self.lookup(key).await {
            Lookup::Hit(value) => {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            Lookup::Miss => true,
            Lookup::StoreDown => false,
        };
        debug!(key = %key, "cache miss");

        let guard = self.join_flight(format!("{key}#{}.{}", fence.global, fence.stripe));

        let result = guard
            .flight
            .get_or_init(|| async move {
                // A previous flight may have populated the key since our lookup.
                if store_healthy {
                    if let Lookup::Hit(value) = self.lookup(key).await {
                        return Ok(value);
                    }
                }

                let (value, ttl) = match load().await {
                    Ok(loaded) => loaded,
                    Err(e) => return Err(e),
                };
                if store_healthy {
                    self.populate(key, fence, &value, ttl).await;
                }
                Ok(value)
            })
            .await
            .clone();

        drop(guard);
        result
    }

    async fn lookup(&self, key: &CacheKey) -> Lookup {
        match self.get(key).await {
            Ok(Some(value)) => Lookup::Hit(value),
            Ok(None) => Lookup::Miss,
            Err(e) => {
                warn!(key = %key, "cache read failed, querying directly: {e}");
                Lookup::StoreDown
            }
        }
    }

    /// Writes `value` unless an eviction touched the key's applicant (or
    /// everything) since the load started. The read guard is held across the
    /// write so an eviction cannot slip in between the check and the store.
    async fn populate(
        &self,
        key: &CacheKey,
        fence: Fence,
        value: &MatchResult,
        ttl: Duration,
    ) {
        let generations = self.generations.read().await;
        if generations.current(key.applicant_id) != fence {
            debug!(key = %key, "invalidated during load, result not cached");
            return;
        }

        match self.set(key, value, ttl).await {
            Ok(()) => debug!(key = %key, ttl_secs = ttl.as_secs(), "cache populated"),
            Err(e) => warn!(key = %key, "cache write failed: {e}"),
        }
    }

    fn join_flight(&self, key: String) -> FlightGuard<'_> {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        let flight = match flights.get(&key) {
            Some(flight) if !flight.initialized() => Arc::clone(flight),
            _ => {
                let flight: Flight = Arc::new(OnceCell::new());
                flights.insert(key.clone(), Arc::clone(&flight));
                flight
            }
        };
        FlightGuard {
            flights: &self.flights,
            key,
            flight,
        }
    }
}
