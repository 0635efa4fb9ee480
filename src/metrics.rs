//! Translator and job counters, reported on `/api/stats`.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Translation counters shared by every job of the process.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Translator process invocations, retries included
    translator_calls: AtomicUsize,

    /// Invocations that failed (spawn, exit status, timeout, bad output)
    translator_failures: AtomicUsize,

    keys_translated: AtomicUsize,
    keys_unchanged: AtomicUsize,
    keys_failed: AtomicUsize,

    jobs_started: AtomicUsize,
    jobs_completed: AtomicUsize,
    jobs_cancelled: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_translator_call(&self) {
        self.translator_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translator_failure(&self) {
        self.translator_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the item outcomes of one batch.
    pub fn record_batch(&self, translated: usize, unchanged: usize, failed: usize) {
        self.keys_translated.fetch_add(translated, Ordering::Relaxed);
        self.keys_unchanged.fetch_add(unchanged, Ordering::Relaxed);
        self.keys_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_job_started(&self) {
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_cancelled(&self) {
        self.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let calls = self.translator_calls.load(Ordering::Relaxed);
        let failures = self.translator_failures.load(Ordering::Relaxed);
        let translator_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            translator_calls: calls,
            translator_failures: failures,
            translator_success_rate,
            keys_translated: self.keys_translated.load(Ordering::Relaxed),
            keys_unchanged: self.keys_unchanged.load(Ordering::Relaxed),
            keys_failed: self.keys_failed.load(Ordering::Relaxed),
            jobs_started: self.jobs_started.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_cancelled: self.jobs_cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`TranslationMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub translator_calls: usize,
    pub translator_failures: usize,

    /// Percentage (0-100) of translator calls that succeeded
    pub translator_success_rate: f64,

    pub keys_translated: usize,
    pub keys_unchanged: usize,
    pub keys_failed: usize,
    pub jobs_started: usize,
    pub jobs_completed: usize,
    pub jobs_cancelled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = TranslationMetrics::new().report();
        assert_eq!(report.translator_calls, 0);
        assert_eq!(report.translator_success_rate, 0.0);
    }

    #[test]
    fn test_success_rate() {
        let metrics = TranslationMetrics::new();
        for _ in 0..4 {
            metrics.record_translator_call();
        }
        metrics.record_translator_failure();

        let report = metrics.report();
        assert_eq!(report.translator_calls, 4);
        assert_eq!(report.translator_failures, 1);
        assert_eq!(report.translator_success_rate, 75.0);
    }

    #[test]
    fn test_batch_and_job_counters() {
        let metrics = TranslationMetrics::new();
        metrics.record_job_started();
        metrics.record_batch(3, 1, 2);
        metrics.record_batch(1, 0, 0);
        metrics.record_job_completed();

        let report = metrics.report();
        assert_eq!(report.keys_translated, 4);
        assert_eq!(report.keys_unchanged, 1);
        assert_eq!(report.keys_failed, 2);
        assert_eq!(report.jobs_started, 1);
        assert_eq!(report.jobs_completed, 1);
        assert_eq!(report.jobs_cancelled, 0);
    }
}
