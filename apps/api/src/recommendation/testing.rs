//! Fakes and fixtures shared by the recommendation tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{oneshot, Notify};

use crate::applicant::repository::{ProfileRepository, ProfileSource};
use crate::jobs::repository::JobRepository;
use crate::models::applicant::{ApplicantProfile, ProfileUpdate};
use crate::models::job::{Job, JobUpdate, RecommendedJob};
use crate::recommendation::matching::is_recommendable;
use crate::recommendation::normalizer::MatchKey;
use crate::recommendation::query::MatchQueryPort;
use crate::recommendation::store::{CacheError, CacheStore};

pub fn make_job(id: i64, skills: &[&str], location: &str, min: i32, max: i32) -> Job {
    Job {
        id,
        job_title: format!("Job {id}"),
        skills_required: skills.iter().map(|s| s.to_string()).collect(),
        location: location.to_string(),
        minimum_experience: min,
        maximum_experience: max,
        specialization: None,
        industry_type: Some("IT".to_string()),
        creation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        job_status: "active".to_string(),
    }
}

pub fn make_recommended(id: i64, saved: bool) -> RecommendedJob {
    RecommendedJob {
        job: make_job(id, &["rust"], "Remote", 0, 10),
        is_saved: saved,
    }
}

pub fn make_profile(
    applicant_id: i64,
    skills: &[&str],
    locations: &[&str],
    experience: Option<&str>,
) -> ApplicantProfile {
    ApplicantProfile {
        applicant_id,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        preferred_locations: locations.iter().map(|s| s.to_string()).collect(),
        experience: experience.map(str::to_string),
        specialization: None,
        updated_at: Utc::now(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Match query port
// ────────────────────────────────────────────────────────────────────────────

/// In-memory `MatchQueryPort` that counts upstream calls.
#[derive(Default)]
pub struct FakeMatchQuery {
    jobs: Mutex<Vec<Job>>,
    saved: HashSet<(i64, i64)>,
    delay: Option<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeMatchQuery {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            ..Self::default()
        }
    }

    pub fn with_saved(mut self, applicant_id: i64, job_id: i64) -> Self {
        self.saved.insert((applicant_id, job_id));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn replace_jobs(&self, jobs: Vec<Job>) {
        *self.jobs.lock().unwrap() = jobs;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatchQueryPort for FakeMatchQuery {
    async fn find_all(&self, applicant_id: i64, key: &MatchKey) -> Result<Vec<RecommendedJob>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }

        let mut matched: Vec<RecommendedJob> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|job| is_recommendable(key, job))
            .map(|job| RecommendedJob {
                job: job.clone(),
                is_saved: self.saved.contains(&(applicant_id, job.id)),
            })
            .collect();
        matched.sort_by(|a, b| {
            b.job
                .creation_date
                .cmp(&a.job.creation_date)
                .then(b.job.id.cmp(&a.job.id))
        });
        Ok(matched)
    }
}

/// Job writes land in the same list the match query reads.
#[async_trait]
impl JobRepository for FakeMatchQuery {
    async fn update_job(&self, job_id: i64, update: &JobUpdate) -> sqlx::Result<Option<Job>> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.iter_mut().find(|job| job.id == job_id) else {
            return Ok(None);
        };
        job.job_title = update.job_title.clone();
        job.skills_required = update.skills_required.clone();
        job.location = update.location.trim().to_string();
        job.minimum_experience = update.minimum_experience;
        job.maximum_experience = update.maximum_experience;
        job.specialization = update.specialization.clone();
        job.industry_type = update.industry_type.clone();
        Ok(Some(job.clone()))
    }

    async fn change_job_status(&self, job_id: i64, status: &str) -> sqlx::Result<Option<Job>> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.iter_mut().find(|job| job.id == job_id) else {
            return Ok(None);
        };
        job.job_status = status.to_string();
        Ok(Some(job.clone()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profile source
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeProfiles {
    profiles: Mutex<HashMap<i64, ApplicantProfile>>,
}

impl FakeProfiles {
    pub fn new(profiles: Vec<ApplicantProfile>) -> Self {
        Self {
            profiles: Mutex::new(profiles.into_iter().map(|p| (p.applicant_id, p)).collect()),
        }
    }

    pub fn put(&self, profile: ApplicantProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.applicant_id, profile);
    }
}

#[async_trait]
impl ProfileSource for FakeProfiles {
    async fn find_profile(&self, applicant_id: i64) -> Result<Option<ApplicantProfile>> {
        Ok(self.profiles.lock().unwrap().get(&applicant_id).cloned())
    }
}

#[async_trait]
impl ProfileRepository for FakeProfiles {
    async fn save_profile(
        &self,
        applicant_id: i64,
        update: &ProfileUpdate,
    ) -> sqlx::Result<ApplicantProfile> {
        let profile = ApplicantProfile {
            applicant_id,
            skills: update.skills.clone(),
            preferred_locations: update.preferred_locations.clone(),
            experience: update.experience.clone(),
            specialization: update.specialization.clone(),
            updated_at: Utc::now(),
        };
        self.put(profile.clone());
        Ok(profile)
    }
}

/// Profile source that, on its first lookup, reports the profile it read and
/// then holds the caller until released.
pub struct PausingProfiles {
    inner: Arc<FakeProfiles>,
    pause: Mutex<Option<(oneshot::Sender<()>, Arc<Notify>)>>,
}

impl PausingProfiles {
    pub fn wrap(inner: Arc<FakeProfiles>) -> (Self, oneshot::Receiver<()>, Arc<Notify>) {
        let (reached_tx, reached_rx) = oneshot::channel();
        let release = Arc::new(Notify::new());
        let source = Self {
            inner,
            pause: Mutex::new(Some((reached_tx, Arc::clone(&release)))),
        };
        (source, reached_rx, release)
    }
}

#[async_trait]
impl ProfileSource for PausingProfiles {
    async fn find_profile(&self, applicant_id: i64) -> Result<Option<ApplicantProfile>> {
        let profile = self.inner.find_profile(applicant_id).await?;
        let pause = self.pause.lock().unwrap().take();
        if let Some((reached, release)) = pause {
            let _ = reached.send(());
            release.notified().await;
        }
        Ok(profile)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cache store
// ────────────────────────────────────────────────────────────────────────────

/// A cache store whose backend is unreachable.
pub struct FailingStore;

fn refused() -> CacheError {
    CacheError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(refused())
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(refused())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(refused())
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        Err(refused())
    }
}
