use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::applicant::{ApplicantProfile, ProfileUpdate};

const PROFILE_COLUMNS: &str =
    "applicant_id, skills, preferred_locations, experience, specialization, updated_at";

/// Profile lookup used by the recommendation engine.
///
/// Carried in the service as `Arc<dyn ProfileSource>`; tests swap in an in-memory map.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn find_profile(&self, applicant_id: i64) -> Result<Option<ApplicantProfile>>;
}

/// Profile storage including the write path.
#[async_trait]
pub trait ProfileRepository: ProfileSource {
    /// Replaces the applicant's matching attributes, creating the profile if needed.
    async fn save_profile(
        &self,
        applicant_id: i64,
        update: &ProfileUpdate,
    ) -> sqlx::Result<ApplicantProfile>;
}

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileSource for PgProfileRepository {
    async fn find_profile(&self, applicant_id: i64) -> Result<Option<ApplicantProfile>> {
        let profile = sqlx::query_as::<_, ApplicantProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM applicant_profiles WHERE applicant_id = $1"
        ))
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn save_profile(
        &self,
        applicant_id: i64,
        update: &ProfileUpdate,
    ) -> sqlx::Result<ApplicantProfile> {
        sqlx::query_as::<_, ApplicantProfile>(&format!(
            r#"
            INSERT INTO applicant_profiles
                (applicant_id, skills, preferred_locations, experience, specialization, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (applicant_id) DO UPDATE SET
                skills = EXCLUDED.skills,
                preferred_locations = EXCLUDED.preferred_locations,
                experience = EXCLUDED.experience,
                specialization = EXCLUDED.specialization,
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(applicant_id)
        .bind(&update.skills)
        .bind(&update.preferred_locations)
        .bind(&update.experience)
        .bind(&update.specialization)
        .fetch_one(&self.pool)
        .await
    }
}
