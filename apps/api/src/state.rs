use std::sync::Arc;

use sqlx::PgPool;
use tokio::time::Instant;

use crate::applicant::repository::{PgProfileRepository, ProfileRepository};
use crate::config::Config;
use crate::jobs::repository::{JobRepository, PgJobRepository};
use crate::recommendation::cache::RecommendationCache;
use crate::recommendation::invalidation::InvalidationCoordinator;
use crate::recommendation::query::{MatchQueryPort, PgMatchQuery};
use crate::recommendation::service::RecommendationService;
use crate::recommendation::store::CacheStore;
use crate::recommendation::ttl::{FixedLifetime, TtlPolicy};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub profiles: Arc<dyn ProfileRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub recommendations: Arc<RecommendationService>,
    /// Called by the write paths after they commit.
    pub invalidation: Arc<InvalidationCoordinator>,
}

impl AppState {
    /// Wires the recommendation engine over PostgreSQL and the given cache store.
    pub fn new(db: PgPool, config: Config, store: Arc<dyn CacheStore>) -> Self {
        Self::with_backends(
            config,
            Arc::new(PgProfileRepository::new(db.clone())),
            Arc::new(PgJobRepository::new(db.clone())),
            Arc::new(PgMatchQuery::new(db)),
            store,
        )
    }

    /// Wires the engine over arbitrary storage. The same profile repository
    /// serves the write path and the engine's profile lookups.
    pub fn with_backends<P>(
        config: Config,
        profiles: Arc<P>,
        jobs: Arc<dyn JobRepository>,
        matches: Arc<dyn MatchQueryPort>,
        store: Arc<dyn CacheStore>,
    ) -> Self
    where
        P: ProfileRepository + 'static,
    {
        let cache = Arc::new(RecommendationCache::new(store));
        let ttl = TtlPolicy::new(
            Arc::new(FixedLifetime::days(config.job_open_days)),
            config.cache_min_ttl,
        );
        let recommendations = Arc::new(RecommendationService::new(
            profiles.clone(),
            matches,
            Arc::clone(&cache),
            ttl,
        ));
        let invalidation = Arc::new(InvalidationCoordinator::new(cache));

        Self {
            config,
            profiles,
            jobs,
            recommendations,
            invalidation,
        }
    }

    /// Deadline for a request starting now.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.config.request_timeout
    }
}
