//! Batch translation through an external translator.
//!
//! - `job`: job, item and summary types
//! - `state`: the per-locale job registry (pause, resume, cancel)
//! - `orchestrator`: key selection and the batch loop
//! - `translator`: the translator trait and the CLI process implementation
//! - `prompt`, `validator`, `priority`: batch prompt, output checks, key ranking

mod job;
mod orchestrator;
mod priority;
mod prompt;
mod state;
mod translator;
mod validator;

pub use job::{BatchItemResult, ItemStatus, JobInfo, JobState, TranslationMode, TranslationSummary};
pub use orchestrator::{Orchestrator, PreparedJob, TranslateOptions};
pub use priority::{filter_by_priority, Priority};
pub use prompt::build_batch_prompt;
pub use state::{JobControl, TranslationStateManager};
pub use translator::{parse_translation_output, BatchRequest, CliTranslator, Translator};
pub use validator::{TranslationValidator, ValidationReport};
