use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status values that take a job out of circulation. Anything else counts as open.
pub const CLOSED_STATUSES: &[&str] = &["inactive", "closed", "expired"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Closed,
}

impl JobStatus {
    pub fn from_status(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        if CLOSED_STATUSES.contains(&normalized.as_str()) {
            JobStatus::Closed
        } else {
            JobStatus::Open
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub job_title: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub minimum_experience: i32,
    pub maximum_experience: i32,
    pub specialization: Option<String>,
    pub industry_type: Option<String>,
    pub creation_date: NaiveDate,
    pub job_status: String,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_status(&self.job_status)
    }

    pub fn is_open(&self) -> bool {
        self.status() == JobStatus::Open
    }
}

/// A job as seen by one applicant: the saved flag is per-applicant and attached at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecommendedJob {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub job: Job,
    pub is_saved: bool,
}

/// Replacement body for `PUT /api/v1/jobs/:id`. Status and creation date are
/// not part of it; status changes go through their own route.
#[derive(Debug, Clone, Deserialize)]
pub struct JobUpdate {
    pub job_title: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub minimum_experience: i32,
    pub maximum_experience: i32,
    pub specialization: Option<String>,
    pub industry_type: Option<String>,
}

impl JobUpdate {
    /// Experience bounds must be non-negative and ordered.
    pub fn validate(&self) -> Result<(), String> {
        if self.minimum_experience < 0 || self.maximum_experience < 0 {
            return Err("experience bounds must not be negative".to_string());
        }
        if self.minimum_experience > self.maximum_experience {
            return Err(format!(
                "minimum_experience ({}) exceeds maximum_experience ({})",
                self.minimum_experience, self.maximum_experience
            ));
        }
        if self.location.trim().is_empty() {
            return Err("location must not be blank".to_string());
        }
        Ok(())
    }
}
