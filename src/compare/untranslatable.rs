//! Values that should not be translated at all.
//!
//! A locale value made only of digits, punctuation, whitespace or
//! placeholders does not need a translation key. Matching values are
//! reported as removal candidates together with the literal that should
//! replace the lookup in code.

use crate::compare::identical::{IdenticalFilter, IdenticalFilterConfig};
use crate::locale::FlatKeys;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// What replaces a translation lookup whose value is untranslatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Inline the value itself
    KeepSelf,
    /// Collapse to a single space
    Space,
    /// Collapse to the empty string
    Empty,
    /// Collapse to a single underscore
    Underscore,
}

impl ReplacementPolicy {
    pub fn replacement(self, value: &str) -> String {
        match self {
            ReplacementPolicy::KeepSelf => value.to_string(),
            ReplacementPolicy::Space => " ".to_string(),
            ReplacementPolicy::Empty => String::new(),
            ReplacementPolicy::Underscore => "_".to_string(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntranslatablePattern {
    pub name: String,
    pub pattern: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub policy: ReplacementPolicy,
    #[serde(default)]
    pub description: String,
}

impl UntranslatablePattern {
    fn new(name: &str, pattern: &str, policy: ReplacementPolicy, description: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            enabled: true,
            policy,
            description: description.to_string(),
        }
    }
}

/// Contents of the untranslatable config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntranslatableConfig {
    #[serde(default = "default_patterns")]
    pub patterns: Vec<UntranslatablePattern>,
    #[serde(default)]
    pub identical_filter: IdenticalFilterConfig,
}

impl Default for UntranslatableConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            identical_filter: IdenticalFilterConfig::default(),
        }
    }
}

fn default_patterns() -> Vec<UntranslatablePattern> {
    use ReplacementPolicy::*;
    vec![
        UntranslatablePattern::new("numbers", r"^[+\-]?\d+(?:[.,]\d+)*$", KeepSelf, "Plain numbers"),
        UntranslatablePattern::new("underscores", r"^_+$", Underscore, "Underscores only"),
        UntranslatablePattern::new(
            "punctuation",
            r"^\s*[\p{P}\p{S}][\p{P}\p{S}\s]*$",
            KeepSelf,
            "Punctuation and symbols only",
        ),
        UntranslatablePattern::new("whitespace", r"^\s+$", Space, "Whitespace only"),
        UntranslatablePattern::new("empty", r"^$", Empty, "Empty string"),
        UntranslatablePattern::new(
            "placeholders",
            r"^\s*(?:(?:\{\{\s*[\w.]+\s*\}\}|\{\s*[\w.]+\s*\})\s*)+$",
            KeepSelf,
            "Interpolation placeholders only",
        ),
    ]
}

impl UntranslatableConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No untranslatable config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(self).context("Failed to serialize untranslatable config")?;
        content.push('\n');
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Check every pattern and the identical-filter pattern compile.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.patterns {
            Regex::new(&pattern.pattern)
                .with_context(|| format!("Invalid pattern '{}': {}", pattern.name, pattern.pattern))?;
        }
        IdenticalFilter::new(&self.identical_filter)?;
        Ok(())
    }

    /// Compile the enabled patterns, skipping (and logging) invalid ones.
    pub fn compiled_patterns(&self) -> Vec<CompiledPattern> {
        self.patterns
            .iter()
            .filter(|p| p.enabled)
            .filter_map(|p| match Regex::new(&p.pattern) {
                Ok(regex) => Some(CompiledPattern {
                    name: p.name.clone(),
                    regex,
                    policy: p.policy,
                }),
                Err(e) => {
                    warn!("Skipping invalid untranslatable pattern '{}': {}", p.name, e);
                    None
                }
            })
            .collect()
    }

    /// Identical-value filter, falling back to defaults on an invalid pattern.
    pub fn identical_filter(&self) -> IdenticalFilter {
        IdenticalFilter::new(&self.identical_filter).unwrap_or_else(|e| {
            warn!("{:#}; using the default identical filter", e);
            IdenticalFilter::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
    pub policy: ReplacementPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonTranslatable {
    pub key: String,
    pub value: String,
    pub pattern: String,
    pub policy: ReplacementPolicy,
    pub suggested_replacement: String,
}

/// Values matching an enabled pattern. The first matching pattern wins.
pub fn find_non_translatable(keys: &FlatKeys, patterns: &[CompiledPattern]) -> Vec<NonTranslatable> {
    keys.iter()
        .filter_map(|(key, value)| {
            patterns
                .iter()
                .find(|p| p.regex.is_match(value))
                .map(|p| NonTranslatable {
                    key: key.clone(),
                    value: value.clone(),
                    pattern: p.name.clone(),
                    policy: p.policy,
                    suggested_replacement: p.policy.replacement(value),
                })
        })
        .collect()
}

/// The untranslatable config as editable at runtime, backed by its file.
#[derive(Debug)]
pub struct UntranslatableConfigStore {
    path: PathBuf,
    config: RwLock<UntranslatableConfig>,
}

impl UntranslatableConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = UntranslatableConfig::load(&path)?;
        Ok(Self {
            path,
            config: RwLock::new(config),
        })
    }

    pub fn in_memory(config: UntranslatableConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: RwLock::new(config),
        }
    }

    pub fn get(&self) -> UntranslatableConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate, persist, then swap in a new config.
    pub fn replace(&self, config: UntranslatableConfig) -> Result<()> {
        config.validate()?;
        config.save(&self.path)?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        info!("Updated untranslatable config at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn flat(pairs: &[(&str, &str)]) -> FlatKeys {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_patterns_classify_values() {
        let keys = flat(&[
            ("price.zero", "0"),
            ("price.big", "1,000.50"),
            ("sep.dash", " - "),
            ("sep.space", "   "),
            ("sep.empty", ""),
            ("sep.under", "__"),
            ("tpl.amount", "{amount}"),
            ("text.hello", "Hello"),
            ("text.mixed", "{count} items"),
        ]);
        let patterns = UntranslatableConfig::default().compiled_patterns();
        let found = find_non_translatable(&keys, &patterns);

        let by_key = |k: &str| found.iter().find(|f| f.key == k).map(|f| f.pattern.as_str());
        assert_eq!(by_key("price.zero"), Some("numbers"));
        assert_eq!(by_key("price.big"), Some("numbers"));
        assert_eq!(by_key("sep.dash"), Some("punctuation"));
        assert_eq!(by_key("sep.space"), Some("whitespace"));
        assert_eq!(by_key("sep.empty"), Some("empty"));
        assert_eq!(by_key("sep.under"), Some("underscores"));
        assert_eq!(by_key("tpl.amount"), Some("placeholders"));
        assert_eq!(by_key("text.hello"), None);
        assert_eq!(by_key("text.mixed"), None);
    }

    #[test]
    fn test_replacement_policies() {
        assert_eq!(ReplacementPolicy::KeepSelf.replacement("42"), "42");
        assert_eq!(ReplacementPolicy::Space.replacement("   "), " ");
        assert_eq!(ReplacementPolicy::Empty.replacement("x"), "");
        assert_eq!(ReplacementPolicy::Underscore.replacement("___"), "_");
    }

    #[test]
    fn test_disabled_and_invalid_patterns_skipped() {
        let mut config = UntranslatableConfig::default();
        config.patterns[0].enabled = false;
        config.patterns.push(UntranslatablePattern::new(
            "broken",
            "([0-9",
            ReplacementPolicy::KeepSelf,
            "",
        ));

        let names: Vec<_> = config
            .compiled_patterns()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert!(!names.contains(&"numbers".to_string()));
        assert!(!names.contains(&"broken".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = UntranslatableConfig::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, UntranslatableConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "patterns": [ { "name": "ids", "pattern": "^#\\d+$", "policy": "keep_self" } ] }"#,
        )
        .unwrap();

        let config = UntranslatableConfig::load(&path).unwrap();
        assert_eq!(config.patterns.len(), 1);
        assert!(config.patterns[0].enabled);
        assert_eq!(config.identical_filter, IdenticalFilterConfig::default());
    }

    #[test]
    fn test_store_replace_validates_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let store = UntranslatableConfigStore::open(&path).unwrap();

        let mut bad = store.get();
        bad.patterns[0].pattern = "(".to_string();
        assert!(store.replace(bad).is_err());
        assert!(!path.exists());

        let mut good = store.get();
        good.patterns.retain(|p| p.name != "empty");
        store.replace(good.clone()).unwrap();
        assert_eq!(UntranslatableConfig::load(&path).unwrap(), good);
        assert_eq!(store.get(), good);
    }
}
