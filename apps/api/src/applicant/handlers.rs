use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::applicant::{ApplicantProfile, ProfileUpdate};
use crate::state::AppState;

/// PUT /api/v1/applicants/:id/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(applicant_id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ApplicantProfile>, AppError> {
    let profile = state.profiles.save_profile(applicant_id, &update).await?;
    info!(applicant_id, "applicant profile saved");

    // Cached recommendations for the old profile must be gone before we answer.
    state.invalidation.on_profile_updated(applicant_id).await?;
    Ok(Json(profile))
}
