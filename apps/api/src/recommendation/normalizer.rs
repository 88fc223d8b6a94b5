//! Profile normalization: turns a stored applicant profile into the canonical
//! `MatchKey` used both for matching and for cache addressing.

use std::collections::BTreeSet;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::models::applicant::ApplicantProfile;
use crate::recommendation::error::RecommendationError;

/// Hex characters of the SHA-256 digest kept in cache keys.
const DIGEST_LEN: usize = 16;

/// Canonical, order-independent view of an applicant's matching attributes.
///
/// Sets are `BTreeSet` so that two profiles listing the same skills in a
/// different order (or with duplicates) serialize, and therefore hash, identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchKey {
    pub skills: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub experience: Option<i32>,
    pub specialization: Option<String>,
}

impl MatchKey {
    /// Short stable digest of the key, used as the `matchKeyHash` cache-key component.
    pub fn digest(&self) -> String {
        // BTreeSet + derived Serialize gives a deterministic byte stream.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        let hex = format!("{:x}", hasher.finalize());
        hex[..DIGEST_LEN].to_string()
    }
}

/// Derives the match key for `applicant_id`. Fails only when the profile is absent.
pub fn normalize(
    applicant_id: i64,
    profile: Option<&ApplicantProfile>,
) -> Result<MatchKey, RecommendationError> {
    let profile = profile.ok_or(RecommendationError::ProfileNotFound(applicant_id))?;

    let skills = profile
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let locations = profile
        .preferred_locations
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    let experience = parse_experience(profile.experience.as_deref());
    if experience.is_none() {
        warn!(
            applicant_id,
            raw_experience = ?profile.experience,
            "degraded match: experience not parseable, experience bound relaxed"
        );
    }

    Ok(MatchKey {
        skills,
        locations,
        experience,
        specialization: non_blank(profile.specialization.as_deref()),
    })
}

/// Parses free-text experience as whole years. Negative or non-numeric input yields `None`.
pub fn parse_experience(raw: Option<&str>) -> Option<i32> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|years| *years >= 0)
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
