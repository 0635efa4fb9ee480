//! In-memory registry of translation jobs.
//!
//! At most one job per locale is registered (active or paused). The registry
//! is not persisted: after a restart every in-flight job is forgotten, and
//! keys it had already saved stay saved.

use crate::error::StateError;
use crate::translate::job::{JobInfo, JobState, TranslationMode};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct JobEntry {
    info: JobInfo,
    cancel: CancellationToken,
    paused: watch::Sender<bool>,
}

/// Handle held by the task running a job.
#[derive(Debug)]
pub struct JobControl {
    info: JobInfo,
    cancel: CancellationToken,
    paused: watch::Receiver<bool>,
}

impl JobControl {
    pub fn id(&self) -> u64 {
        self.info.id
    }

    pub fn locale(&self) -> &str {
        &self.info.locale
    }

    /// The job as registered.
    pub fn info(&self) -> &JobInfo {
        &self.info
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Block while the job is paused. Returns `false` if the job was
    /// cancelled (or purged) instead of resumed.
    pub async fn wait_while_paused(&mut self) -> bool {
        let mut announced = false;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            if !*self.paused.borrow_and_update() {
                return true;
            }
            if !announced {
                debug!("Job {} for {} is paused, waiting", self.info.id, self.info.locale);
                announced = true;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}

#[derive(Default)]
pub struct TranslationStateManager {
    jobs: Mutex<BTreeMap<String, JobEntry>>,
    cancelled: Mutex<HashSet<String>>,
    next_id: AtomicU64,
}

impl TranslationStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, BTreeMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancelled(&self) -> MutexGuard<'_, HashSet<String>> {
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new job, failing if the locale already has one.
    pub fn add_active(
        &self,
        locale: &str,
        mode: TranslationMode,
        batch_size: usize,
    ) -> Result<JobControl, StateError> {
        let mut jobs = self.jobs();
        if jobs.contains_key(locale) {
            return Err(StateError::Conflict(locale.to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        let (paused_tx, paused_rx) = watch::channel(false);
        let info = JobInfo {
            id,
            locale: locale.to_string(),
            mode,
            batch_size,
            state: JobState::Active,
            started_at: Utc::now(),
        };
        jobs.insert(
            locale.to_string(),
            JobEntry {
                info: info.clone(),
                cancel: cancel.clone(),
                paused: paused_tx,
            },
        );
        drop(jobs);
        self.cancelled().remove(locale);

        debug!("Registered job {} for {}", id, locale);
        Ok(JobControl {
            info,
            cancel,
            paused: paused_rx,
        })
    }

    pub fn is_active(&self, locale: &str) -> bool {
        self.state_of(locale) == Some(JobState::Active)
    }

    pub fn is_paused(&self, locale: &str) -> bool {
        self.state_of(locale) == Some(JobState::Paused)
    }

    /// True when the locale's last job was cancelled and no new one started since.
    pub fn is_cancelled(&self, locale: &str) -> bool {
        self.cancelled().contains(locale)
    }

    fn state_of(&self, locale: &str) -> Option<JobState> {
        self.jobs().get(locale).map(|e| e.info.state)
    }

    pub fn get(&self, locale: &str) -> Option<JobInfo> {
        self.jobs().get(locale).map(|e| e.info.clone())
    }

    /// All registered jobs, ordered by locale.
    pub fn list(&self) -> Vec<JobInfo> {
        self.jobs().values().map(|e| e.info.clone()).collect()
    }

    pub fn pause(&self, locale: &str) -> Result<JobInfo, StateError> {
        self.transition(locale, JobState::Active, JobState::Paused)
    }

    pub fn resume(&self, locale: &str) -> Result<JobInfo, StateError> {
        self.transition(locale, JobState::Paused, JobState::Active)
    }

    fn transition(&self, locale: &str, from: JobState, to: JobState) -> Result<JobInfo, StateError> {
        let mut jobs = self.jobs();
        let entry = jobs
            .get_mut(locale)
            .ok_or_else(|| StateError::NotFound(locale.to_string()))?;
        if entry.info.state != from {
            return Err(StateError::InvalidTransition {
                locale: locale.to_string(),
                expected: match from {
                    JobState::Active => "active",
                    JobState::Paused => "paused",
                },
            });
        }
        entry.info.state = to;
        entry.paused.send_replace(to == JobState::Paused);
        info!("Translation for {} is now {:?}", locale, to);
        Ok(entry.info.clone())
    }

    /// Cancel a job: trip its token and drop it from the registry.
    pub fn cancel(&self, locale: &str) -> Result<JobInfo, StateError> {
        let entry = self
            .jobs()
            .remove(locale)
            .ok_or_else(|| StateError::NotFound(locale.to_string()))?;
        entry.cancel.cancel();
        self.cancelled().insert(locale.to_string());
        info!("Cancelled translation job {} for {}", entry.info.id, locale);
        Ok(entry.info)
    }

    pub fn cancel_all(&self) -> Vec<JobInfo> {
        let entries: Vec<JobEntry> = std::mem::take(&mut *self.jobs()).into_values().collect();
        let mut cancelled = self.cancelled();
        entries
            .into_iter()
            .map(|entry| {
                entry.cancel.cancel();
                cancelled.insert(entry.info.locale.clone());
                entry.info
            })
            .collect()
    }

    /// Unregister a finished job. A no-op if the locale's current job is a
    /// different one (the finished job was cancelled and replaced).
    pub fn finish(&self, locale: &str, id: u64) {
        let mut jobs = self.jobs();
        if jobs.get(locale).is_some_and(|e| e.info.id == id) {
            jobs.remove(locale);
            debug!("Job {} for {} finished", id, locale);
        }
    }
}
