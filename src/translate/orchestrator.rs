//! Batch translation of a locale.
//!
//! A job walks the selected keys in reference order, in fixed-size batches.
//! Before each batch it honours cancellation and pause; each batch is one
//! translator call whose successful results are saved before the next batch
//! starts. Translator failures only affect their own batch.

use crate::broadcast::Broadcaster;
use crate::compare::{diff, find_identical_values, KeyValue, UntranslatableConfigStore};
use crate::error::{ApiError, TranslatorError};
use crate::events::ProgressEvent;
use crate::locale::{LanguageRegistry, LocaleStore, Script};
use crate::metrics::TranslationMetrics;
use crate::retry::{with_retry_if, RetryConfig};
use crate::translate::job::{
    BatchItemResult, ItemStatus, JobInfo, TranslationMode, TranslationSummary,
};
use crate::translate::priority::{filter_by_priority, Priority};
use crate::translate::state::{JobControl, TranslationStateManager};
use crate::translate::translator::{BatchRequest, Translator};
use crate::translate::validator::TranslationValidator;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Number of key names passed to the translator as context.
const CONTEXT_SAMPLE: usize = 5;

/// Options of a translation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateOptions {
    #[serde(default)]
    pub mode: TranslationMode,
    pub batch_size: Option<usize>,
    /// Only translate keys of this priority
    pub priority: Option<Priority>,
}

/// A registered job with its keys, ready to run.
#[derive(Debug)]
pub struct PreparedJob {
    control: JobControl,
    items: Vec<KeyValue>,
}

impl PreparedJob {
    pub fn info(&self) -> &JobInfo {
        self.control.info()
    }

    pub fn total_keys(&self) -> usize {
        self.items.len()
    }
}

pub struct Orchestrator {
    store: Arc<LocaleStore>,
    untranslatable: Arc<UntranslatableConfigStore>,
    translator: Arc<dyn Translator>,
    state: Arc<TranslationStateManager>,
    broadcaster: Broadcaster,
    metrics: Arc<TranslationMetrics>,
    retry: RetryConfig,
    default_batch_size: usize,
    batch_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<LocaleStore>,
        untranslatable: Arc<UntranslatableConfigStore>,
        translator: Arc<dyn Translator>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            store,
            untranslatable,
            translator,
            state: Arc::new(TranslationStateManager::new()),
            broadcaster,
            metrics: Arc::new(TranslationMetrics::new()),
            retry: RetryConfig::default(),
            default_batch_size: 20,
            batch_delay: Duration::from_secs(1),
        }
    }

    pub fn with_batching(mut self, default_batch_size: usize, batch_delay: Duration) -> Self {
        self.default_batch_size = default_batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> &Arc<TranslationStateManager> {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Reference keys to translate for `locale`, in reference order.
    pub fn keys_to_translate(&self, locale: &str, mode: TranslationMode) -> Vec<KeyValue> {
        let reference = self.store.reference_keys();
        let target = self.store.keys(locale).unwrap_or_default();

        let missing = || diff(&reference, &target).missing;
        let identical = || {
            let filter = self.untranslatable.get().identical_filter();
            find_identical_values(&reference, &target, &filter)
        };

        match mode {
            TranslationMode::Missing => missing(),
            TranslationMode::Identical => identical(),
            TranslationMode::Both => {
                let selected: HashSet<String> = missing()
                    .into_iter()
                    .chain(identical())
                    .map(|kv| kv.key)
                    .collect();
                reference
                    .iter()
                    .filter(|(key, _)| selected.contains(*key))
                    .map(|(key, value)| KeyValue::new(key, value))
                    .collect()
            }
        }
    }

    /// Select the keys and register the job. Fails on a bad request or when
    /// the locale already has a job.
    pub fn prepare(&self, locale: &str, options: &TranslateOptions) -> Result<PreparedJob, ApiError> {
        if locale == self.store.reference_code() {
            return Err(ApiError::BadRequest(format!(
                "'{}' is the reference locale and cannot be translated",
                locale
            )));
        }
        if !self.store.contains(locale) {
            return Err(ApiError::NotFound(format!("Unknown locale '{}'", locale)));
        }
        let batch_size = options.batch_size.unwrap_or(self.default_batch_size);
        if batch_size == 0 {
            return Err(ApiError::BadRequest("batch_size must be greater than zero".to_string()));
        }

        let mut items = self.keys_to_translate(locale, options.mode);
        if let Some(priority) = options.priority {
            items = filter_by_priority(items, priority, |kv| kv.key.as_str());
        }

        let control = self.state.add_active(locale, options.mode, batch_size)?;
        Ok(PreparedJob { control, items })
    }

    /// Run `job` on its own task. The job outlives the caller: dropping the
    /// handle does not stop it, cancellation does.
    pub fn spawn(self: &Arc<Self>, job: PreparedJob) -> JoinHandle<TranslationSummary> {
        let orchestrator = self.clone();
        let locale = job.info().locale.clone();
        let id = job.info().id;
        tokio::spawn(async move {
            let guard = FinishGuard {
                state: orchestrator.state.clone(),
                locale,
                id,
            };
            let summary = orchestrator.run(job).await;
            drop(guard);
            summary
        })
    }

    /// Run a prepared job to completion or cancellation.
    pub async fn run(&self, job: PreparedJob) -> TranslationSummary {
        let PreparedJob { mut control, items } = job;
        let info = control.info().clone();
        let locale = info.locale.as_str();
        let started = Instant::now();

        let batches: Vec<&[KeyValue]> = items.chunks(info.batch_size).collect();
        let total_batches = batches.len();
        let mut summary = TranslationSummary {
            job_id: info.id,
            locale: locale.to_string(),
            mode: info.mode,
            total_keys: items.len(),
            total_batches,
            completed_batches: 0,
            success_count: 0,
            unchanged_count: 0,
            error_count: 0,
            cancelled: false,
            unchanged: Vec::new(),
            errors: Vec::new(),
            started_at: info.started_at,
            duration_ms: 0,
        };

        let registry = LanguageRegistry::get();
        let language = registry.display_name(locale);
        let script = registry.script(locale);

        self.metrics.record_job_started();
        info!(
            "Translating {} {} keys into {} ({} batches of {})",
            items.len(),
            info.mode,
            language,
            total_batches,
            info.batch_size
        );
        self.broadcaster.broadcast(&ProgressEvent::TranslationStart {
            locale: locale.to_string(),
            job_id: info.id,
            mode: info.mode,
            total_keys: items.len(),
            total_batches,
            batch_size: info.batch_size,
        });

        for (index, batch) in batches.iter().enumerate() {
            let number = index + 1;

            if !control.wait_while_paused().await {
                summary.cancelled = true;
                break;
            }

            self.broadcaster.broadcast(&ProgressEvent::BatchProcessing {
                locale: locale.to_string(),
                batch: number,
                total_batches,
                keys: batch.iter().map(|kv| kv.key.clone()).collect(),
            });

            let request = BatchRequest {
                locale: locale.to_string(),
                language: language.clone(),
                texts: batch.iter().map(|kv| kv.value.clone()).collect(),
                context: sample_context(batch),
            };
            let outcome = tokio::select! {
                biased;
                _ = control.token().cancelled() => None,
                result = self.call_translator(&request) => Some(result),
            };
            let Some(outcome) = outcome else {
                summary.cancelled = true;
                break;
            };

            let mut results = match outcome.and_then(|t| evaluate(locale, batch, t, script)) {
                Ok(results) => results,
                Err(e) => {
                    warn!("Batch {}/{} for {} failed: {}", number, total_batches, locale, e);
                    self.batch_error(locale, number, total_batches, e.to_string());
                    batch
                        .iter()
                        .map(|kv| BatchItemResult::error(&kv.key, &kv.value))
                        .collect()
                }
            };

            // A cancelled job never saves the batch it was running
            if control.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            self.persist(locale, number, total_batches, &mut results);

            let statuses: Vec<ItemStatus> = results.iter().map(|r| r.status).collect();
            let count = |status| statuses.iter().filter(|s| **s == status).count();
            self.metrics.record_batch(
                count(ItemStatus::Success),
                count(ItemStatus::Unchanged),
                count(ItemStatus::Error),
            );
            info!(
                "Batch {}/{} for {}: {} translated, {} unchanged, {} errors",
                number,
                total_batches,
                locale,
                count(ItemStatus::Success),
                count(ItemStatus::Unchanged),
                count(ItemStatus::Error)
            );
            summary.record(&results);
            summary.completed_batches += 1;
            self.broadcaster.broadcast(&ProgressEvent::batch_complete(
                locale,
                number,
                total_batches,
                &statuses,
            ));

            if number < total_batches && !self.batch_delay.is_zero() {
                let interrupted = tokio::select! {
                    _ = control.token().cancelled() => true,
                    _ = tokio::time::sleep(self.batch_delay) => false,
                };
                if interrupted {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.state.finish(locale, info.id);

        if summary.cancelled {
            self.metrics.record_job_cancelled();
            info!(
                "Translation for {} cancelled after {}/{} batches",
                locale, summary.completed_batches, total_batches
            );
            self.broadcaster.broadcast(&ProgressEvent::TranslationCancelled {
                locale: locale.to_string(),
                completed_batches: summary.completed_batches,
                total_batches,
                translated: summary.success_count,
            });
        } else {
            self.metrics.record_job_completed();
            info!(
                "✓ Translation for {} complete: {} translated, {} unchanged, {} errors",
                locale, summary.success_count, summary.unchanged_count, summary.error_count
            );
            self.broadcaster.broadcast(&ProgressEvent::TranslationComplete {
                locale: locale.to_string(),
                summary: summary.clone(),
            });
        }

        summary
    }

    async fn call_translator(&self, request: &BatchRequest) -> Result<Vec<String>, TranslatorError> {
        let translator = &self.translator;
        let metrics = &self.metrics;
        let operation_name = format!("Translator ({})", request.locale);

        with_retry_if(
            &self.retry,
            &operation_name,
            || async move {
                metrics.record_translator_call();
                let result = translator.translate_batch(request).await;
                if result.is_err() {
                    metrics.record_translator_failure();
                }
                result
            },
            TranslatorError::is_retryable,
        )
        .await
    }

    /// Save the batch's successful translations. If the save fails they
    /// are downgraded to errors.
    fn persist(&self, locale: &str, number: usize, total_batches: usize, results: &mut [BatchItemResult]) {
        let updates: Vec<(String, String)> = results
            .iter()
            .filter(|r| r.status == ItemStatus::Success)
            .map(|r| (r.key.clone(), r.translated.clone()))
            .collect();
        if updates.is_empty() {
            return;
        }

        if let Err(e) = self.store.update_keys(locale, &updates) {
            error!("Failed to save batch {}/{} for {}: {:#}", number, total_batches, locale, e);
            self.batch_error(locale, number, total_batches, format!("{:#}", e));
            for item in results.iter_mut().filter(|r| r.status == ItemStatus::Success) {
                item.translated = item.original.clone();
                item.status = ItemStatus::Error;
            }
            return;
        }

        for item in results.iter().filter(|r| r.status == ItemStatus::Success) {
            self.broadcaster.broadcast(&ProgressEvent::KeyTranslated {
                locale: locale.to_string(),
                key: item.key.clone(),
                original: item.original.clone(),
                translated: item.translated.clone(),
            });
        }
    }

    fn batch_error(&self, locale: &str, batch: usize, total_batches: usize, error: String) {
        self.broadcaster.broadcast(&ProgressEvent::BatchError {
            locale: locale.to_string(),
            batch,
            total_batches,
            error,
        });
    }
}

/// Unregisters a spawned job even if its task panics.
struct FinishGuard {
    state: Arc<TranslationStateManager>,
    locale: String,
    id: u64,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.state.finish(&self.locale, self.id);
    }
}

fn sample_context(batch: &[KeyValue]) -> String {
    batch
        .iter()
        .take(CONTEXT_SAMPLE)
        .map(|kv| kv.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Match translations to the batch by position and classify each one.
fn evaluate(
    locale: &str,
    batch: &[KeyValue],
    translations: Vec<String>,
    script: Script,
) -> Result<Vec<BatchItemResult>, TranslatorError> {
    if translations.len() != batch.len() {
        return Err(TranslatorError::CountMismatch {
            expected: batch.len(),
            actual: translations.len(),
        });
    }

    Ok(batch
        .iter()
        .zip(translations)
        .map(|(kv, translated)| {
            if translated.trim().is_empty() {
                warn!("{} [{}]: empty translation, keeping original", locale, kv.key);
                return BatchItemResult::error(&kv.key, &kv.value);
            }
            let status = if translated.to_lowercase() == kv.value.to_lowercase() {
                ItemStatus::Unchanged
            } else {
                for warning in TranslationValidator::validate(&kv.value, &translated, script).warnings {
                    warn!("{} [{}]: {}", locale, kv.key, warning);
                }
                ItemStatus::Success
            };
            BatchItemResult {
                key: kv.key.clone(),
                original: kv.value.clone(),
                translated,
                status,
            }
        })
        .collect())
}
