pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::applicant::handlers as applicant;
use crate::jobs::handlers as jobs;
use crate::recommendation::handlers as recommendation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendations (read-through cached)
        .route(
            "/api/v1/applicants/:id/recommendations",
            get(recommendation::handle_get_recommendations),
        )
        .route(
            "/api/v1/applicants/:id/recommendations/count",
            get(recommendation::handle_get_recommendation_count),
        )
        .route(
            "/api/v1/applicants/:id/matching-jobs",
            get(recommendation::handle_get_matching_jobs),
        )
        // Write paths (evict on commit)
        .route(
            "/api/v1/applicants/:id/profile",
            put(applicant::handle_update_profile),
        )
        .route("/api/v1/jobs/:id", put(jobs::handle_update_job))
        .route(
            "/api/v1/jobs/:id/status/:status",
            post(jobs::handle_change_job_status),
        )
        .with_state(state)
}
