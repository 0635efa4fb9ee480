//! Progress events pushed to WebSocket clients.
//!
//! Serialized as JSON objects tagged by `type`, e.g.
//! `{"type":"key_translated","locale":"es","key":"nav.home",...}`.

use crate::translate::{ItemStatus, JobInfo, TranslationMode, TranslationSummary};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    TranslationStart {
        locale: String,
        job_id: u64,
        mode: TranslationMode,
        total_keys: usize,
        total_batches: usize,
        batch_size: usize,
    },
    BatchProcessing {
        locale: String,
        /// 1-based batch number
        batch: usize,
        total_batches: usize,
        keys: Vec<String>,
    },
    KeyTranslated {
        locale: String,
        key: String,
        original: String,
        translated: String,
    },
    BatchComplete {
        locale: String,
        batch: usize,
        total_batches: usize,
        success: usize,
        unchanged: usize,
        errors: usize,
    },
    BatchError {
        locale: String,
        batch: usize,
        total_batches: usize,
        error: String,
    },
    TranslationPaused {
        locale: String,
        job: JobInfo,
    },
    TranslationResumed {
        locale: String,
        job: JobInfo,
    },
    TranslationCancelled {
        locale: String,
        completed_batches: usize,
        total_batches: usize,
        translated: usize,
    },
    TranslationComplete {
        locale: String,
        summary: TranslationSummary,
    },
}

impl ProgressEvent {
    pub fn batch_complete(locale: &str, batch: usize, total_batches: usize, statuses: &[ItemStatus]) -> Self {
        let count = |status: ItemStatus| statuses.iter().filter(|s| **s == status).count();
        ProgressEvent::BatchComplete {
            locale: locale.to_string(),
            batch,
            total_batches,
            success: count(ItemStatus::Success),
            unchanged: count(ItemStatus::Unchanged),
            errors: count(ItemStatus::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_event_tagged_by_type() {
        let event = ProgressEvent::KeyTranslated {
            locale: "es".to_string(),
            key: "nav.home".to_string(),
            original: "Home".to_string(),
            translated: "Inicio".to_string(),
        };
        let value: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "key_translated",
                "locale": "es",
                "key": "nav.home",
                "original": "Home",
                "translated": "Inicio"
            })
        );
    }

    #[test]
    fn test_batch_complete_counts() {
        let event = ProgressEvent::batch_complete(
            "es",
            2,
            3,
            &[ItemStatus::Success, ItemStatus::Error, ItemStatus::Success],
        );
        let value: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "batch_complete");
        assert_eq!(value["success"], 2);
        assert_eq!(value["unchanged"], 0);
        assert_eq!(value["errors"], 1);
    }
}
