use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::job::{Job, JobUpdate};

const JOB_COLUMNS: &str = "id, job_title, skills_required, location, minimum_experience, \
     maximum_experience, specialization, industry_type, creation_date, job_status";

/// Job writes. Both return `None` when the job does not exist.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Replaces a job's matching attributes.
    async fn update_job(&self, job_id: i64, update: &JobUpdate) -> sqlx::Result<Option<Job>>;

    /// Sets the job's status string.
    async fn change_job_status(&self, job_id: i64, status: &str) -> sqlx::Result<Option<Job>>;
}

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn update_job(&self, job_id: i64, update: &JobUpdate) -> sqlx::Result<Option<Job>> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET
                job_title = $2,
                skills_required = $3,
                location = $4,
                minimum_experience = $5,
                maximum_experience = $6,
                specialization = $7,
                industry_type = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(&update.job_title)
        .bind(&update.skills_required)
        .bind(update.location.trim())
        .bind(update.minimum_experience)
        .bind(update.maximum_experience)
        .bind(&update.specialization)
        .bind(&update.industry_type)
        .fetch_optional(&self.pool)
        .await
    }

    async fn change_job_status(&self, job_id: i64, status: &str) -> sqlx::Result<Option<Job>> {
        sqlx::query_as::<_, Job>(&format!(
            "UPDATE jobs SET job_status = $2, updated_at = NOW() WHERE id = $1 RETURNING {JOB_COLUMNS}"
        ))
        .bind(job_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }
}
