use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw applicant profile as stored. Experience stays free text; it is parsed
/// only when a match key is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApplicantProfile {
    pub applicant_id: i64,
    pub skills: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub experience: Option<String>,
    pub specialization: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Replacement body for `PUT /api/v1/applicants/:id/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    pub experience: Option<String>,
    pub specialization: Option<String>,
}
