//! Recommendation read paths: profile lookup, normalization, read-through
//! cache, and the match query behind it.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::applicant::repository::ProfileSource;
use crate::models::job::RecommendedJob;
use crate::recommendation::cache::{CacheKey, MatchResult, RecommendationCache};
use crate::recommendation::error::RecommendationError;
use crate::recommendation::normalizer::{normalize, MatchKey};
use crate::recommendation::query::{JobPage, MatchQueryPort, PageRequest};
use crate::recommendation::ttl::TtlPolicy;

pub struct RecommendationService {
    profiles: Arc<dyn ProfileSource>,
    matches: Arc<dyn MatchQueryPort>,
    cache: Arc<RecommendationCache>,
    ttl: TtlPolicy,
}

impl RecommendationService {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        matches: Arc<dyn MatchQueryPort>,
        cache: Arc<RecommendationCache>,
        ttl: TtlPolicy,
    ) -> Self {
        Self {
            profiles,
            matches,
            cache,
            ttl,
        }
    }

    /// One page of open jobs matching the applicant's profile, plus the size of the whole match set.
    pub async fn get_recommendations(
        &self,
        applicant_id: i64,
        page: i64,
        size: i64,
        deadline: Instant,
    ) -> Result<JobPage, RecommendationError> {
        let request = PageRequest::new(page, size)?;

        within(deadline, "recommendations", async {
            let fence = self.cache.fence(applicant_id).await;
            let key = self.match_key(applicant_id).await?;
            let cache_key = CacheKey::recommended_jobs(applicant_id, &key, request);

            let (matches, ttl, key) = (&self.matches, &self.ttl, &key);
            let result = self
                .cache
                .get_or_populate(&cache_key, fence, move || async move {
                    let page = matches
                        .find_page(applicant_id, key, request)
                        .await
                        .map_err(|e| RecommendationError::upstream("match query failed", e))?;
                    let expires_in = ttl.ttl_for(&page.jobs, Utc::now());
                    Ok::<_, RecommendationError>((MatchResult::Page(page), expires_in))
                })
                .await?;

            match result {
                MatchResult::Page(page) => Ok(page),
                other => Err(self.discard_mismatched(&cache_key, other).await),
            }
        })
        .await
    }

    /// Size of the applicant's full match set, cached apart from the pages.
    pub async fn count_recommended_jobs(
        &self,
        applicant_id: i64,
        deadline: Instant,
    ) -> Result<u64, RecommendationError> {
        within(deadline, "recommendation count", async {
            let fence = self.cache.fence(applicant_id).await;
            let key = self.match_key(applicant_id).await?;
            let cache_key = CacheKey::recommended_count(applicant_id);

            let (matches, ttl, key) = (&self.matches, &self.ttl, &key);
            let result = self
                .cache
                .get_or_populate(&cache_key, fence, move || async move {
                    let all = matches
                        .find_all(applicant_id, key)
                        .await
                        .map_err(|e| RecommendationError::upstream("match query failed", e))?;
                    let expires_in = ttl.ttl_for(&all, Utc::now());
                    Ok::<_, RecommendationError>((MatchResult::Count(all.len() as u64), expires_in))
                })
                .await?;

            match result {
                MatchResult::Count(count) => Ok(count),
                other => Err(self.discard_mismatched(&cache_key, other).await),
            }
        })
        .await
    }

    /// Every open job matching the applicant's profile, unpaged.
    pub async fn find_matching_jobs(
        &self,
        applicant_id: i64,
        deadline: Instant,
    ) -> Result<Vec<RecommendedJob>, RecommendationError> {
        within(deadline, "matching jobs", async {
            let fence = self.cache.fence(applicant_id).await;
            let key = self.match_key(applicant_id).await?;
            let cache_key = CacheKey::matching_jobs(applicant_id, &key);

            let (matches, ttl, key) = (&self.matches, &self.ttl, &key);
            let result = self
                .cache
                .get_or_populate(&cache_key, fence, move || async move {
                    let all = matches
                        .find_all(applicant_id, key)
                        .await
                        .map_err(|e| RecommendationError::upstream("match query failed", e))?;
                    let expires_in = ttl.ttl_for(&all, Utc::now());
                    Ok::<_, RecommendationError>((MatchResult::Jobs(all), expires_in))
                })
                .await?;

            match result {
                MatchResult::Jobs(jobs) => Ok(jobs),
                other => Err(self.discard_mismatched(&cache_key, other).await),
            }
        })
        .await
    }

    async fn match_key(&self, applicant_id: i64) -> Result<MatchKey, RecommendationError> {
        let profile = self
            .profiles
            .find_profile(applicant_id)
            .await
            .map_err(|e| RecommendationError::upstream("profile lookup failed", e))?;
        let key = normalize(applicant_id, profile.as_ref())?;
        debug!(applicant_id, digest = %key.digest(), "match key derived");
        Ok(key)
    }

    /// A key holding the wrong kind of result is evicted so the next read recomputes it.
    async fn discard_mismatched(&self, key: &CacheKey, found: MatchResult) -> RecommendationError {
        warn!(key = %key, ?found, "cache entry holds an unexpected result kind");
        if let Err(e) = self.cache.evict(std::slice::from_ref(key)).await {
            warn!(key = %key, "could not evict mismatched entry: {e}");
        }
        RecommendationError::Unavailable(format!("cache entry {key} was unusable"))
    }
}

/// Runs `work` against the caller's deadline.
async fn within<T>(
    deadline: Instant,
    operation: &str,
    work: impl Future<Output = Result<T, RecommendationError>>,
) -> Result<T, RecommendationError> {
    match tokio::time::timeout_at(deadline, work).await {
        Ok(result) => result,
        Err(_) => {
            error!("{operation} exceeded the request deadline");
            Err(RecommendationError::Unavailable(format!(
                "{operation} timed out"
            )))
        }
    }
}
