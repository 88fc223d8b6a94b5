use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::job::{Job, JobUpdate};
use crate::state::AppState;

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(update): Json<JobUpdate>,
) -> Result<Json<Job>, AppError> {
    update.validate().map_err(AppError::Validation)?;

    let job = state
        .jobs
        .update_job(job_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    info!(job_id, "job updated");

    state.invalidation.on_job_updated(job_id).await?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/status/:status
pub async fn handle_change_job_status(
    State(state): State<AppState>,
    Path((job_id, status)): Path<(i64, String)>,
) -> Result<Json<Job>, AppError> {
    let status = status.trim();
    if status.is_empty() {
        return Err(AppError::Validation("job status must not be blank".to_string()));
    }

    let job = state
        .jobs
        .change_job_status(job_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    info!(job_id, status, open = job.is_open(), "job status changed");

    state.invalidation.on_job_updated(job_id).await?;
    Ok(Json(job))
}
