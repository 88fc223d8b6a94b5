use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::RecommendedJob;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub jobs: Vec<RecommendedJob>,
    pub total: u64,
    pub page: i64,
    pub size: i64,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// GET /api/v1/applicants/:id/recommendations
pub async fn handle_get_recommendations(
    State(state): State<AppState>,
    Path(applicant_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let result = state
        .recommendations
        .get_recommendations(applicant_id, params.page, params.size, state.deadline())
        .await?;
    Ok(Json(RecommendationsResponse {
        jobs: result.jobs,
        total: result.total,
        page: params.page,
        size: params.size,
    }))
}

/// GET /api/v1/applicants/:id/recommendations/count
pub async fn handle_get_recommendation_count(
    State(state): State<AppState>,
    Path(applicant_id): Path<i64>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state
        .recommendations
        .count_recommended_jobs(applicant_id, state.deadline())
        .await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/v1/applicants/:id/matching-jobs
pub async fn handle_get_matching_jobs(
    State(state): State<AppState>,
    Path(applicant_id): Path<i64>,
) -> Result<Json<Vec<RecommendedJob>>, AppError> {
    let jobs = state
        .recommendations
        .find_matching_jobs(applicant_id, state.deadline())
        .await?;
    Ok(Json(jobs))
}
