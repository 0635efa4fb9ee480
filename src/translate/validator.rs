//! Translation quality checks.
//!
//! Every finding here is a warning: the translation is still saved. The
//! checks catch the usual ways an LLM damages UI strings (dropped
//! placeholders, numbers turned into words, output in the wrong script).

use crate::compare::extract_placeholders;
use crate::locale::Script;
use regex::Regex;
use std::sync::OnceLock;

/// Validation findings for one translated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct TranslationValidator;

static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();

fn numeric_regex() -> &'static Regex {
    NUMERIC_REGEX.get_or_init(|| Regex::new(r"^[+\-]?[\d.,\s]*\d[\d.,\s]*%?$").unwrap())
}

impl TranslationValidator {
    /// Check a translation into a language written in `expected_script`.
    pub fn validate(original: &str, translated: &str, expected_script: Script) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut orig_placeholders = extract_placeholders(original);
        let mut trans_placeholders = extract_placeholders(translated);
        orig_placeholders.sort();
        trans_placeholders.sort();
        if orig_placeholders != trans_placeholders {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig_placeholders, trans_placeholders
            ));
        }

        let original = original.trim();
        let translated = translated.trim();
        if numeric_regex().is_match(original) && !numeric_regex().is_match(translated) {
            report.warnings.push(format!(
                "Numeric value became non-numeric: {:?} -> {:?}",
                original, translated
            ));
        }

        if Self::is_latin(original) {
            if let Some(found) = Self::unexpected_script(translated, expected_script) {
                report.warnings.push(format!(
                    "Unexpected script: expected {:?}, translation contains {:?}",
                    expected_script, found
                ));
            }
        }

        report
    }

    /// True when `text` has letters and all of them are Latin.
    fn is_latin(text: &str) -> bool {
        let mut letters = text.chars().filter_map(Script::of_char).peekable();
        letters.peek().is_some() && letters.all(|s| s == Script::Latin)
    }

    fn unexpected_script(text: &str, expected: Script) -> Option<Script> {
        text.chars()
            .filter_map(Script::of_char)
            .find(|&s| !expected.accepts(s))
    }
}
