//! In-place source and locale rewrites driven by scan results.
//!
//! Every rewrite works file by file: a file that cannot be read or written
//! is reported in [`RewriteReport::errors`] and the remaining files are
//! still processed.

use crate::compare::KeyValue;
use crate::locale::{LocaleStore, KEY_SEPARATOR};
use crate::scanner::files::{display_path, FileError};
use crate::scanner::usage::find_binding;
use crate::scanner::wrappers::{find_wrappers, is_safe_jsx_text};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    pub replacements: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteReport {
    pub files_changed: Vec<FileChange>,
    pub total_replacements: usize,
    pub errors: Vec<FileError>,
}

impl RewriteReport {
    fn record(&mut self, path: String, replacements: usize) {
        if replacements > 0 {
            self.total_replacements += replacements;
            self.files_changed.push(FileChange { path, replacements });
        }
    }
}

/// Apply `rewrite` to each file, writing back only files that changed.
fn rewrite_files<F>(root: &Path, files: &[PathBuf], mut rewrite: F) -> RewriteReport
where
    F: FnMut(&str) -> (String, usize),
{
    let mut report = RewriteReport::default();

    for path in files {
        let shown = display_path(root, path);
        let result = std::fs::read_to_string(path).and_then(|content| {
            let (updated, count) = rewrite(&content);
            if count > 0 {
                std::fs::write(path, updated)?;
            }
            Ok(count)
        });

        match result {
            Ok(count) => report.record(shown, count),
            Err(e) => {
                warn!("Failed to rewrite {}: {}", shown, e);
                report.errors.push(FileError {
                    path: shown,
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

// ==================== Wrapper cleanup ====================

/// Unwrap redundant `{"text"}` wrappers whose text is in `values`.
///
/// Child wrappers that cannot be unwrapped safely are left alone.
pub fn clean_wrappers(root: &Path, files: &[PathBuf], values: &[String]) -> RewriteReport {
    let selected: HashSet<&str> = values.iter().map(String::as_str).collect();

    let report = rewrite_files(root, files, |content| {
        let mut updated = content.to_string();
        let mut count = 0;
        // Back to front so earlier ranges stay valid
        for found in find_wrappers(content).into_iter().rev() {
            if !selected.contains(found.value.as_str()) {
                continue;
            }
            if let Some(replacement) = found.replacement() {
                updated.replace_range(found.range.clone(), &replacement);
                count += 1;
            }
        }
        (updated, count)
    });

    info!(
        "✓ Unwrapped {} wrapper(s) in {} file(s)",
        report.total_replacements,
        report.files_changed.len()
    );
    report
}

// ==================== Untranslatable cleanup ====================

/// A key to drop from the locales, and the literal that replaces its lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntranslatableReplacement {
    pub key: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UntranslatableCleanReport {
    #[serde(flatten)]
    pub rewrite: RewriteReport,
    /// Keys removed per locale
    pub keys_removed: BTreeMap<String, usize>,
    pub locale_errors: Vec<FileError>,
}

fn quoted_key_pattern(key: &str) -> String {
    let key = regex::escape(key);
    format!(r#"(?:"{key}"|'{key}'|`{key}`)"#)
}

fn js_string_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// Replace lookups of `key` through the file's translator binding.
///
/// `{t("key")}` in child position becomes the raw text when JSX renders it
/// unchanged, otherwise `{"text"}`. Any other `t("key")` call becomes a
/// string literal.
fn inline_lookups(content: &str, variable: &str, local_key: &str, replacement: &str) -> (String, usize) {
    let var = regex::escape(variable);
    let key = quoted_key_pattern(local_key);
    let mut count = 0;

    // Both patterns are built from escaped input
    let child = Regex::new(&format!(r"\{{\s*{var}\(\s*{key}\s*\)\s*\}}")).unwrap();
    let call = Regex::new(&format!(r"(^|[^\w.$]){var}\(\s*{key}\s*\)")).unwrap();

    let as_child = if is_safe_jsx_text(replacement) {
        replacement.to_string()
    } else {
        format!("{{{}}}", js_string_literal(replacement))
    };
    let updated = child.replace_all(content, |_: &Captures| {
        count += 1;
        as_child.clone()
    });

    let literal = js_string_literal(replacement);
    let updated = call
        .replace_all(&updated, |caps: &Captures| {
            count += 1;
            format!("{}{}", &caps[1], literal)
        })
        .into_owned();

    (updated, count)
}

/// Inline the replacement text wherever code looks up one of the keys,
/// then remove the keys from every locale.
///
/// Keys are processed longest first.
pub fn clean_untranslatable(
    root: &Path,
    files: &[PathBuf],
    store: &LocaleStore,
    replacements: &[UntranslatableReplacement],
) -> UntranslatableCleanReport {
    let mut ordered: Vec<&UntranslatableReplacement> = replacements.iter().collect();
    ordered.sort_by(|a, b| b.key.len().cmp(&a.key.len()));

    let rewrite = rewrite_files(root, files, |content| {
        let Some(binding) = find_binding(content) else {
            return (content.to_string(), 0);
        };
        let mut updated = content.to_string();
        let mut count = 0;
        for item in &ordered {
            if let Some(local) = binding.local_key(&item.key) {
                let (next, n) = inline_lookups(&updated, &binding.variable, local, &item.replacement);
                updated = next;
                count += n;
            }
        }
        (updated, count)
    });

    let keys: Vec<String> = ordered.iter().map(|r| r.key.clone()).collect();
    let mut report = UntranslatableCleanReport {
        rewrite,
        ..Default::default()
    };
    for code in store.codes() {
        match store.remove_keys(&code, &keys) {
            Ok(removed) => {
                report.keys_removed.insert(code, removed);
            }
            Err(e) => {
                warn!("Failed to remove keys from locale {}: {:#}", code, e);
                report.locale_errors.push(FileError {
                    path: store.path_for(&code).display().to_string(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        "✓ Inlined {} lookup(s) and removed {} key(s) from {} locale(s)",
        report.rewrite.total_replacements,
        keys.len(),
        report.keys_removed.len()
    );
    report
}

// ==================== Restore ====================

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Restored keys with the value they were given
    pub restored: Vec<KeyValue>,
    /// Keys added per locale
    pub added: BTreeMap<String, usize>,
    /// Locales that could not be written; the others are still updated
    pub locale_errors: Vec<FileError>,
}

/// `createAccount` / `create_account` / `create-account` → `Create account`.
pub fn humanize(segment: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in segment.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let sentence = words
        .iter()
        .map(|w| {
            // Keep acronyms as written
            if w.chars().all(|c| c.is_uppercase() || c.is_ascii_digit()) {
                w.clone()
            } else {
                w.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Add each key to every locale that lacks it, valued with its humanized
/// last segment.
pub fn restore_keys(store: &LocaleStore, keys: &[String]) -> RestoreReport {
    let restored: Vec<KeyValue> = keys
        .iter()
        .map(|key| {
            let last = key.rsplit(KEY_SEPARATOR).next().unwrap_or(key);
            KeyValue::new(key, humanize(last))
        })
        .collect();

    let mut codes = store.codes();
    if !codes.iter().any(|c| c == store.reference_code()) {
        codes.insert(0, store.reference_code().to_string());
    }

    let mut report = RestoreReport {
        restored,
        ..Default::default()
    };
    for code in codes {
        let existing = store.keys(&code).unwrap_or_default();
        let updates: Vec<(String, String)> = report
            .restored
            .iter()
            .filter(|kv| !existing.contains_key(&kv.key))
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect();
        if updates.is_empty() {
            continue;
        }
        match store.update_keys(&code, &updates) {
            Ok(()) => {
                report.added.insert(code, updates.len());
            }
            Err(e) => {
                warn!("Failed to restore keys into locale {}: {:#}", code, e);
                report.locale_errors.push(FileError {
                    path: store.path_for(&code).display().to_string(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        "✓ Restored {} key(s) into {} locale(s)",
        report.restored.len(),
        report.added.len()
    );
    report
}
