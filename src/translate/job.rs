use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which keys a job translates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    /// Keys absent from the target locale
    #[default]
    Missing,
    /// Keys whose value is identical to the reference and not excused by the filter
    Identical,
    /// Missing keys followed by identical keys
    Both,
}

impl fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationMode::Missing => write!(f, "missing"),
            TranslationMode::Identical => write!(f, "identical"),
            TranslationMode::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Active,
    Paused,
}

/// Snapshot of a registered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub id: u64,
    pub locale: String,
    pub mode: TranslationMode,
    pub batch_size: usize,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Translated to something other than the source text
    Success,
    /// The translator returned the source text (ignoring case)
    Unchanged,
    /// No usable translation; the original value is kept
    Error,
}

/// Outcome for one key of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemResult {
    pub key: String,
    pub original: String,
    pub translated: String,
    pub status: ItemStatus,
}

impl BatchItemResult {
    pub fn error(key: &str, original: &str) -> Self {
        Self {
            key: key.to_string(),
            original: original.to_string(),
            translated: original.to_string(),
            status: ItemStatus::Error,
        }
    }
}

/// Final report of a job, returned over HTTP and broadcast on completion.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationSummary {
    pub job_id: u64,
    pub locale: String,
    pub mode: TranslationMode,
    pub total_keys: usize,
    pub total_batches: usize,
    pub completed_batches: usize,
    pub success_count: usize,
    pub unchanged_count: usize,
    pub error_count: usize,
    pub cancelled: bool,
    /// Items left as-is by the translator, for manual review
    pub unchanged: Vec<BatchItemResult>,
    pub errors: Vec<BatchItemResult>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TranslationSummary {
    pub(crate) fn record(&mut self, results: &[BatchItemResult]) {
        for item in results {
            match item.status {
                ItemStatus::Success => self.success_count += 1,
                ItemStatus::Unchanged => {
                    self.unchanged_count += 1;
                    self.unchanged.push(item.clone());
                }
                ItemStatus::Error => {
                    self.error_count += 1;
                    self.errors.push(item.clone());
                }
            }
        }
    }
}
