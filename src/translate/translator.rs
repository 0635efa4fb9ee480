//! The external translator boundary.
//!
//! The production translator is a CLI process that reads a prompt on stdin
//! and prints a JSON array of translations on stdout. It is treated as an
//! unreliable collaborator: every failure mode maps to a [`TranslatorError`]
//! and never escapes the batch that triggered it.

use crate::config::Config;
use crate::error::TranslatorError;
use crate::translate::prompt::build_batch_prompt;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// One translator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub locale: String,
    /// English name of the target language
    pub language: String,
    pub texts: Vec<String>,
    /// Sample key names giving the translator some context
    pub context: String,
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `request.texts`, returning one string per input in order.
    ///
    /// Implementations are not required to check the output length; the
    /// orchestrator validates it.
    async fn translate_batch(&self, request: &BatchRequest) -> Result<Vec<String>, TranslatorError>;
}

/// Translator backed by an external command.
#[derive(Debug, Clone)]
pub struct CliTranslator {
    command: String,
    args: Vec<String>,
    min_timeout: Duration,
    per_item_timeout: Duration,
}

const MAX_STDERR_CHARS: usize = 500;

impl CliTranslator {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            min_timeout: Duration::from_secs(90),
            per_item_timeout: Duration::from_secs(3),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.translator_command, config.translator_args.clone())
            .with_timeouts(config.translator_min_timeout, config.translator_per_item_timeout)
    }

    pub fn with_timeouts(mut self, min_timeout: Duration, per_item_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self.per_item_timeout = per_item_timeout;
        self
    }

    /// Timeout for a batch of `batch_len` strings: the per-item budget
    /// scaled by the batch size, never below the minimum.
    pub fn timeout_for(&self, batch_len: usize) -> Duration {
        let scaled = self
            .per_item_timeout
            .saturating_mul(u32::try_from(batch_len).unwrap_or(u32::MAX));
        scaled.max(self.min_timeout)
    }

    async fn run(&self, prompt: String) -> Result<String, TranslatorError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranslatorError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("translator stdin was not captured"))?;
        let write = async move {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranslatorError::ExitStatus {
                status: output.status.to_string(),
                stderr: truncate(stderr.trim(), MAX_STDERR_CHARS),
            });
        }
        // A translator that answers without reading all of its input is fine
        if let Err(e) = written {
            debug!("Translator closed stdin early: {}", e);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Translator for CliTranslator {
    async fn translate_batch(&self, request: &BatchRequest) -> Result<Vec<String>, TranslatorError> {
        let timeout = self.timeout_for(request.texts.len());
        let prompt = build_batch_prompt(request);

        debug!(
            "Invoking {} for {} strings ({}), timeout {:?}",
            self.command,
            request.texts.len(),
            request.locale,
            timeout
        );

        // Dropping the run future on timeout kills the child
        let stdout = tokio::time::timeout(timeout, self.run(prompt))
            .await
            .map_err(|_| TranslatorError::Timeout(timeout))??;

        parse_translation_output(&stdout)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}…", head)
    }
}

/// Contents of the first fenced code block, if any.
fn fenced_block(output: &str) -> Option<&str> {
    let start = output.find("```")?;
    let after_fence = &output[start + 3..];
    // Skip a language tag such as ```json
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Extract the JSON array of translations from translator output.
///
/// Accepts a bare array, an array inside a fenced code block, or an array
/// surrounded by prose.
pub fn parse_translation_output(output: &str) -> Result<Vec<String>, TranslatorError> {
    let trimmed = output.trim();
    let mut candidates = vec![trimmed];
    if let Some(block) = fenced_block(trimmed) {
        candidates.push(block.trim());
    }
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    candidates
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<Vec<String>>(candidate).ok())
        .ok_or_else(|| TranslatorError::MalformedOutput(truncate(trimmed, 200)))
}
