//! Cache expiry tied to job lifecycle: a cached recommendation list must not
//! outlive the jobs it recommends.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};

use crate::models::job::{Job, RecommendedJob};

/// Decides when a job stops accepting applications.
pub trait CloseDateRule: Send + Sync {
    fn closes_at(&self, job: &Job) -> Option<DateTime<Utc>>;
}

/// Jobs stay open for a fixed number of days after their creation date.
pub struct FixedLifetime {
    open_for: chrono::Duration,
}

impl FixedLifetime {
    pub fn days(days: i64) -> Self {
        Self {
            open_for: chrono::Duration::days(days),
        }
    }
}

impl CloseDateRule for FixedLifetime {
    fn closes_at(&self, job: &Job) -> Option<DateTime<Utc>> {
        let created = job.creation_date.and_time(NaiveTime::MIN).and_utc();
        created.checked_add_signed(self.open_for)
    }
}

#[derive(Clone)]
pub struct TtlPolicy {
    rule: Arc<dyn CloseDateRule>,
    fallback: Duration,
}

impl TtlPolicy {
    pub fn new(rule: Arc<dyn CloseDateRule>, fallback: Duration) -> Self {
        Self { rule, fallback }
    }

    /// Time until the soonest future close date among `jobs`, or `fallback`
    /// when none lies ahead of `now`. Never zero.
    pub fn ttl_for(&self, jobs: &[RecommendedJob], now: DateTime<Utc>) -> Duration {
        let soonest = jobs
            .iter()
            .filter_map(|j| self.rule.closes_at(&j.job))
            .filter(|closes| *closes > now)
            .min();

        match soonest {
            Some(closes) => (closes - now)
                .to_std()
                .unwrap_or(self.fallback)
                .max(Duration::from_secs(1)),
            None => self.fallback,
        }
    }
}
