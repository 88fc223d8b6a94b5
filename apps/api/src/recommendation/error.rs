use thiserror::Error;

/// Failures surfaced by the recommendation engine.
///
/// `Clone` so a single upstream result (success or failure) can be handed to
/// every request waiting on the same in-flight population.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendationError {
    #[error("Applicant profile {0} not found")]
    ProfileNotFound(i64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Recommendations unavailable: {0}")]
    Unavailable(String),
}

impl RecommendationError {
    /// Only upstream or cache trouble is worth retrying; the other variants
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecommendationError::Unavailable(_))
    }

    pub(crate) fn upstream(context: &str, err: anyhow::Error) -> Self {
        tracing::error!("{context}: {err:#}");
        RecommendationError::Unavailable(format!("{context}: {err}"))
    }
}
