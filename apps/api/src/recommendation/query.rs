//! Match query port, the engine's only dependency on persistence.
//!
//! `AppState` holds an `Arc<dyn MatchQueryPort>` inside the recommendation
//! service; the default backend is `PgMatchQuery`.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use crate::models::job::{RecommendedJob, CLOSED_STATUSES};
use crate::recommendation::error::RecommendationError;
use crate::recommendation::matching::is_recommendable;
use crate::recommendation::normalizer::MatchKey;

/// Validated, 0-indexed page request. `size` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Result<Self, RecommendationError> {
        if page < 0 {
            return Err(RecommendationError::InvalidArgument(format!(
                "page must not be negative (got {page})"
            )));
        }
        if size <= 0 {
            return Err(RecommendationError::InvalidArgument(format!(
                "size must be greater than zero (got {size})"
            )));
        }
        let page = u32::try_from(page)
            .map_err(|_| RecommendationError::InvalidArgument(format!("page {page} is too large")))?;
        let size = u32::try_from(size)
            .map_err(|_| RecommendationError::InvalidArgument(format!("size {size} is too large")))?;
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_mul(self.size as usize)
    }
}

/// One page of matches plus the size of the whole match set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<RecommendedJob>,
    pub total: u64,
}

impl JobPage {
    /// Cuts `request` out of an already ordered full match list.
    pub fn slice(all: Vec<RecommendedJob>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let jobs = all
            .into_iter()
            .skip(request.offset())
            .take(request.size as usize)
            .collect();
        Self { jobs, total }
    }
}

/// Query capability over open jobs. Implementations do not cache.
#[async_trait]
pub trait MatchQueryPort: Send + Sync {
    /// Every open job matching `key`, annotated with `applicant_id`'s saved state,
    /// in a stable order.
    async fn find_all(&self, applicant_id: i64, key: &MatchKey) -> Result<Vec<RecommendedJob>>;

    /// A page of `find_all`. The default slices the full list, which keeps the
    /// two operations consistent by construction.
    async fn find_page(
        &self,
        applicant_id: i64,
        key: &MatchKey,
        request: PageRequest,
    ) -> Result<JobPage> {
        let all = self.find_all(applicant_id, key).await?;
        Ok(JobPage::slice(all, request))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

/// Candidate rows: open jobs sharing at least one skill with the applicant.
/// Location, experience and specialization are decided by `is_recommendable`.
const CANDIDATES_SQL: &str = r#"
    SELECT j.id, j.job_title, j.skills_required, j.location,
           j.minimum_experience, j.maximum_experience, j.specialization,
           j.industry_type, j.creation_date, j.job_status,
           EXISTS (
               SELECT 1 FROM saved_jobs s
               WHERE s.job_id = j.id AND s.applicant_id = $1
           ) AS is_saved
    FROM jobs j
    WHERE lower(trim(j.job_status)) <> ALL($3)
      AND EXISTS (
          SELECT 1 FROM unnest(j.skills_required) AS sk(name)
          WHERE lower(trim(sk.name)) = ANY($2)
      )
    ORDER BY j.creation_date DESC, j.id DESC
"#;

pub struct PgMatchQuery {
    pool: PgPool,
}

impl PgMatchQuery {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchQueryPort for PgMatchQuery {
    async fn find_all(&self, applicant_id: i64, key: &MatchKey) -> Result<Vec<RecommendedJob>> {
        if key.skills.is_empty() {
            return Ok(Vec::new());
        }

        let skills: Vec<String> = key.skills.iter().cloned().collect();
        let closed: Vec<String> = CLOSED_STATUSES.iter().map(|s| s.to_string()).collect();

        let candidates = sqlx::query_as::<_, RecommendedJob>(CANDIDATES_SQL)
            .bind(applicant_id)
            .bind(&skills)
            .bind(&closed)
            .fetch_all(&self.pool)
            .await?;

        let candidate_count = candidates.len();
        let matched: Vec<RecommendedJob> = candidates
            .into_iter()
            .filter(|row| is_recommendable(key, &row.job))
            .collect();

        debug!(
            applicant_id,
            candidates = candidate_count,
            matched = matched.len(),
            "match query completed"
        );
        Ok(matched)
    }
}
