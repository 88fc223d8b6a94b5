//! Cache invalidation driven by the write paths. Both hooks run synchronously
//! after the write commits and complete before the write returns.

use std::sync::Arc;

use tracing::{error, info};

use crate::recommendation::cache::{CacheKey, CacheScope, RecommendationCache};
use crate::recommendation::error::RecommendationError;
use crate::recommendation::store::CacheError;

pub struct InvalidationCoordinator {
    cache: Arc<RecommendationCache>,
}

impl InvalidationCoordinator {
    pub fn new(cache: Arc<RecommendationCache>) -> Self {
        Self { cache }
    }

    /// Evicts everything cached for `applicant_id`: the full match list, every
    /// page, and the count.
    pub async fn on_profile_updated(&self, applicant_id: i64) -> Result<(), RecommendationError> {
        let listings = self
            .cache
            .evict_applicant(applicant_id)
            .await
            .map_err(eviction_failed)?;
        let counts = self
            .cache
            .evict(&[CacheKey::recommended_count(applicant_id)])
            .await
            .map_err(eviction_failed)?;

        info!(
            applicant_id,
            removed = listings + counts,
            "profile updated, applicant recommendations evicted"
        );
        Ok(())
    }

    /// A job edit can move it into or out of any applicant's match set, so
    /// every recommendation scope is cleared for everyone.
    pub async fn on_job_updated(&self, job_id: i64) -> Result<(), RecommendationError> {
        let mut removed = 0;
        for scope in CacheScope::ALL {
            removed += self
                .cache
                .evict_all(scope)
                .await
                .map_err(eviction_failed)?;
        }

        info!(job_id, removed, "job updated, all recommendations evicted");
        Ok(())
    }
}

fn eviction_failed(err: CacheError) -> RecommendationError {
    error!("cache eviction failed: {err}");
    RecommendationError::Unavailable(format!("cache eviction failed: {err}"))
}
