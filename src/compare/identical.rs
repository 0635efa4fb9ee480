//! Detection of values that are byte-identical to the reference and
//! probably untranslated.
//!
//! Many identical values are fine: acronyms, numbers, URLs, brand names.
//! These exclusions are heuristics, so the term lists and the acronym
//! pattern are data ([`IdenticalFilterConfig`]) rather than code.

use crate::compare::diff::KeyValue;
use crate::locale::FlatKeys;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Configurable parts of the identical-value heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdenticalFilterConfig {
    /// Values up to this many characters are never flagged
    pub max_short_length: usize,

    /// Pattern for all-caps tokens treated as acronyms
    pub acronym_pattern: String,

    /// Terms identical in every language (case-insensitive)
    pub universal_terms: Vec<String>,

    /// Short unit and preposition tokens (case-insensitive)
    pub short_tokens: Vec<String>,

    /// Suffixes allowed after a number, as in `24h` or `100 %` (case-insensitive)
    pub units: Vec<String>,
}

impl Default for IdenticalFilterConfig {
    fn default() -> Self {
        let to_vec = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            max_short_length: 2,
            acronym_pattern: r"^[A-Z]{2,6}$".to_string(),
            universal_terms: to_vec(&[
                "OK", "API", "URL", "ID", "FAQ", "KYC", "AML", "NFT", "DeFi", "BTC", "ETH",
                "USDT", "USDC", "USD", "EUR", "2FA", "PDF", "CSV", "JSON", "HTML", "SMS", "QR",
                "Email", "E-mail", "Wi-Fi", "iOS", "Android", "Google", "Apple", "Facebook",
                "Twitter", "Telegram", "Discord", "GitHub", "MetaMask", "WalletConnect",
                "Ethereum", "Bitcoin", "Solana", "Binance", "Stripe", "PayPal", "Visa",
                "Mastercard", "Web3", "P2P", "IP", "OTP", "PIN",
            ]),
            short_tokens: to_vec(&[
                "px", "pt", "em", "rem", "kg", "km", "cm", "mm", "ms", "min", "max", "sec",
                "vs", "via", "per", "etc", "de", "à", "x",
            ]),
            units: to_vec(&[
                "%", "x", "k", "m", "b", "h", "hr", "hrs", "d", "s", "ms", "min", "px", "pt",
                "em", "rem", "kg", "g", "km", "cm", "mm", "kb", "mb", "gb", "tb",
            ]),
        }
    }
}

/// Compiled form of [`IdenticalFilterConfig`].
#[derive(Debug, Clone)]
pub struct IdenticalFilter {
    max_short_length: usize,
    acronym: Regex,
    universal_terms: HashSet<String>,
    short_tokens: HashSet<String>,
    units: HashSet<String>,
}

static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static DATE_FORMAT_REGEX: OnceLock<Regex> = OnceLock::new();

const DATE_TOKENS: &str = "YYYY|yyyy|YY|yy|MMMM|MMM|MM|M|Do|DD|dd|D|d|dddd|ddd|HH|H|hh|h|mm|m|ss|s|A|a";

impl IdenticalFilter {
    pub fn new(config: &IdenticalFilterConfig) -> Result<Self> {
        let acronym = Regex::new(&config.acronym_pattern)
            .with_context(|| format!("Invalid acronym pattern '{}'", config.acronym_pattern))?;
        let lower = |items: &[String]| -> HashSet<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };
        Ok(Self {
            max_short_length: config.max_short_length,
            acronym,
            universal_terms: lower(&config.universal_terms),
            short_tokens: lower(&config.short_tokens),
            units: lower(&config.units),
        })
    }

    /// Why `value` is expected to be identical across languages, if it is.
    pub fn exclusion_reason(&self, value: &str) -> Option<&'static str> {
        let trimmed = value.trim();
        let lower = trimmed.to_lowercase();

        if trimmed.chars().count() <= self.max_short_length {
            return Some("short");
        }
        if self.universal_terms.contains(&lower) {
            return Some("universal_term");
        }
        if self.short_tokens.contains(&lower) {
            return Some("short_token");
        }
        if self.acronym.is_match(trimmed) {
            return Some("acronym");
        }
        if self.is_numeric(trimmed) {
            return Some("numeric");
        }
        if is_placeholder_only(trimmed) {
            return Some("placeholder");
        }
        if url_regex().is_match(trimmed) {
            return Some("url");
        }
        if email_regex().is_match(trimmed) {
            return Some("email");
        }
        if date_format_regex().is_match(trimmed) {
            return Some("date_format");
        }
        None
    }

    /// A number, optionally followed by one of the configured units.
    fn is_numeric(&self, value: &str) -> bool {
        let number = value.trim_end_matches(|c: char| c.is_alphabetic() || c == '%');
        let suffix = &value[number.len()..];
        if !suffix.is_empty() && !self.units.contains(&suffix.to_lowercase()) {
            return false;
        }
        numeric_regex().is_match(number.trim_end())
    }

    pub fn is_language_invariant(&self, value: &str) -> bool {
        self.exclusion_reason(value).is_some()
    }
}

impl Default for IdenticalFilter {
    fn default() -> Self {
        Self::new(&IdenticalFilterConfig::default()).expect("default acronym pattern compiles")
    }
}

fn numeric_regex() -> &'static Regex {
    NUMERIC_REGEX.get_or_init(|| {
        Regex::new(r"^[+\-]?[\d.,\s]*\d[\d.,\s]*$").unwrap()
    })
}

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*[\w.]+\s*\}\}|\{\s*[\w.]+(?:\s*,[^{}]*)?\s*\}|%\d*\$?[sdif@]").unwrap()
    })
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r"^(?:https?://|www\.)\S+$").unwrap())
}

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[\w.+\-]+@[\w\-]+(?:\.[\w\-]+)+$").unwrap())
}

fn date_format_regex() -> &'static Regex {
    DATE_FORMAT_REGEX.get_or_init(|| {
        Regex::new(&format!(
            r"^(?:{tokens})(?:[\s/\-.:,]+(?:{tokens}))+$",
            tokens = DATE_TOKENS
        ))
        .unwrap()
    })
}

/// Placeholders found in `text` (`{name}`, `{{name}}`, `%s`), in order.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    placeholder_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// True when `text` holds at least one placeholder and no letters outside them.
pub fn is_placeholder_only(text: &str) -> bool {
    if !placeholder_regex().is_match(text) {
        return false;
    }
    let rest = placeholder_regex().replace_all(text, "");
    !rest.chars().any(char::is_alphabetic)
}

/// Identical values of `target` that the filter does not excuse, in source order.
pub fn find_identical_values(
    source: &FlatKeys,
    target: &FlatKeys,
    filter: &IdenticalFilter,
) -> Vec<KeyValue> {
    source
        .iter()
        .filter(|(key, value)| target.get(*key) == Some(*value))
        .filter(|(_, value)| !filter.is_language_invariant(value))
        .map(|(key, value)| KeyValue::new(key, value))
        .collect()
}
