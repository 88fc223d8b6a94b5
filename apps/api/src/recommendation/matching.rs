//! The match predicate. Every backend that decides whether a job is
//! recommended for an applicant goes through `is_recommendable`.

use crate::models::job::Job;
use crate::recommendation::normalizer::{non_blank, MatchKey};

/// Binary match between a normalized profile and a job, ignoring lifecycle.
///
/// All four clauses must hold:
/// - at least one shared skill (case-insensitive)
/// - the job location is a preferred location, or the applicant has none
/// - `minimum_experience <= experience <= maximum_experience`, unless experience is unknown
/// - specializations are equal whenever both sides have one
pub fn matches(key: &MatchKey, job: &Job) -> bool {
    skills_overlap(key, job)
        && location_accepted(key, job)
        && experience_in_range(key, job)
        && specialization_compatible(key, job)
}

/// Open jobs that pass `matches`.
pub fn is_recommendable(key: &MatchKey, job: &Job) -> bool {
    job.is_open() && matches(key, job)
}

fn skills_overlap(key: &MatchKey, job: &Job) -> bool {
    job.skills_required
        .iter()
        .any(|skill| key.skills.contains(&skill.trim().to_lowercase()))
}

fn location_accepted(key: &MatchKey, job: &Job) -> bool {
    key.locations.is_empty() || key.locations.contains(job.location.trim())
}

fn experience_in_range(key: &MatchKey, job: &Job) -> bool {
    match key.experience {
        Some(years) => job.minimum_experience <= years && years <= job.maximum_experience,
        None => true,
    }
}

fn specialization_compatible(key: &MatchKey, job: &Job) -> bool {
    match (&key.specialization, non_blank(job.specialization.as_deref())) {
        (Some(wanted), Some(offered)) => *wanted == offered,
        _ => true,
    }
}
