use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Paths
    pub messages_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub untranslatable_config: PathBuf,
    pub excluded_dirs: Vec<String>,

    // Locales
    pub reference_locale: String,

    // External translator
    pub translator_command: String,
    pub translator_args: Vec<String>,
    pub translator_max_attempts: u32,
    pub translator_min_timeout: Duration,
    pub translator_per_item_timeout: Duration,

    // Batching
    pub default_batch_size: usize,
    pub batch_delay: Duration,
}

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".next",
    "dist",
    "build",
    "out",
    ".git",
    "coverage",
];

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_batch_size = env_parse("DEFAULT_BATCH_SIZE", 20usize);
        if default_batch_size == 0 {
            bail!("DEFAULT_BATCH_SIZE must be greater than zero");
        }

        let translator_command = std::env::var("TRANSLATOR_COMMAND")
            .unwrap_or_else(|_| "claude".to_string());
        if translator_command.trim().is_empty() {
            bail!("TRANSLATOR_COMMAND is set but empty");
        }

        Ok(Self {
            // Server
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT", 5000),

            // Paths
            messages_dir: std::env::var("MESSAGES_DIR")
                .unwrap_or_else(|_| "messages".to_string())
                .into(),
            frontend_dir: std::env::var("FRONTEND_DIR")
                .unwrap_or_else(|_| "frontend".to_string())
                .into(),
            untranslatable_config: std::env::var("UNTRANSLATABLE_CONFIG")
                .unwrap_or_else(|_| "untranslatable-config.json".to_string())
                .into(),
            excluded_dirs: std::env::var("EXCLUDED_DIRS")
                .map(|v| split_list(&v, ','))
                .unwrap_or_else(|_| DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect()),

            // Locales
            reference_locale: std::env::var("REFERENCE_LOCALE")
                .unwrap_or_else(|_| "en".to_string()),

            // External translator
            translator_command,
            translator_args: std::env::var("TRANSLATOR_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_else(|_| vec!["-p".to_string()]),
            translator_max_attempts: env_parse("TRANSLATOR_MAX_ATTEMPTS", 1u32).max(1),
            translator_min_timeout: Duration::from_secs(env_parse(
                "TRANSLATOR_MIN_TIMEOUT_SECS",
                90u64,
            )),
            translator_per_item_timeout: Duration::from_secs(env_parse(
                "TRANSLATOR_PER_ITEM_TIMEOUT_SECS",
                3u64,
            )),

            // Batching
            default_batch_size,
            batch_delay: Duration::from_millis(env_parse("BATCH_DELAY_MS", 1000u64)),
        })
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read an environment variable, falling back to `default` when unset or unparsable
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
