//! Language registry: display metadata for locale codes.
//!
//! Locale files are discovered on disk, so any code may appear. The registry
//! only supplies names and the writing system a translation into that
//! language is expected to use; unknown codes get a fallback entry.

use serde::Serialize;
use std::sync::OnceLock;

/// Writing system a language is normally written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Thai,
    Han,
    Japanese,
    Hangul,
    Unknown,
}

/// Metadata for a known language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Locale code as used for file names (e.g., "en", "pt-BR")
    pub code: &'static str,

    /// English name of the language (e.g., "Spanish")
    pub name: &'static str,

    /// Native name of the language (e.g., "Español")
    pub native_name: &'static str,

    /// Expected script of translated text
    pub script: Script,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// Matching is case-insensitive and falls back to the primary subtag,
    /// so "pt-br" finds "pt-BR" and "es-MX" finds "es".
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        let exact = self
            .languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code));
        if exact.is_some() {
            return exact;
        }

        let primary = code.split(['-', '_']).next().unwrap_or(code);
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(primary))
    }

    /// Display name for a locale code, falling back to the upper-cased code.
    pub fn display_name(&self, code: &str) -> String {
        self.get_by_code(code)
            .map(|lang| lang.name.to_string())
            .unwrap_or_else(|| code.to_uppercase())
    }

    /// Expected script for a locale code.
    pub fn script(&self, code: &str) -> Script {
        self.get_by_code(code)
            .map(|lang| lang.script)
            .unwrap_or(Script::Unknown)
    }

    /// Get all known languages.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

/// Default language configurations.
fn default_languages() -> Vec<LanguageConfig> {
    use Script::*;

    let table: &[(&'static str, &'static str, &'static str, Script)] = &[
        ("en", "English", "English", Latin),
        ("es", "Spanish", "Español", Latin),
        ("fr", "French", "Français", Latin),
        ("de", "German", "Deutsch", Latin),
        ("it", "Italian", "Italiano", Latin),
        ("pt", "Portuguese", "Português", Latin),
        ("pt-BR", "Brazilian Portuguese", "Português (Brasil)", Latin),
        ("nl", "Dutch", "Nederlands", Latin),
        ("sv", "Swedish", "Svenska", Latin),
        ("da", "Danish", "Dansk", Latin),
        ("no", "Norwegian", "Norsk", Latin),
        ("fi", "Finnish", "Suomi", Latin),
        ("pl", "Polish", "Polski", Latin),
        ("cs", "Czech", "Čeština", Latin),
        ("ro", "Romanian", "Română", Latin),
        ("hu", "Hungarian", "Magyar", Latin),
        ("tr", "Turkish", "Türkçe", Latin),
        ("id", "Indonesian", "Bahasa Indonesia", Latin),
        ("ms", "Malay", "Bahasa Melayu", Latin),
        ("vi", "Vietnamese", "Tiếng Việt", Latin),
        ("tl", "Filipino", "Filipino", Latin),
        ("sw", "Swahili", "Kiswahili", Latin),
        ("ru", "Russian", "Русский", Cyrillic),
        ("uk", "Ukrainian", "Українська", Cyrillic),
        ("bg", "Bulgarian", "Български", Cyrillic),
        ("el", "Greek", "Ελληνικά", Greek),
        ("ar", "Arabic", "العربية", Arabic),
        ("fa", "Persian", "فارسی", Arabic),
        ("ur", "Urdu", "اردو", Arabic),
        ("he", "Hebrew", "עברית", Hebrew),
        ("hi", "Hindi", "हिन्दी", Devanagari),
        ("bn", "Bengali", "বাংলা", Unknown),
        ("th", "Thai", "ไทย", Thai),
        ("zh", "Chinese", "中文", Han),
        ("zh-TW", "Traditional Chinese", "繁體中文", Han),
        ("ja", "Japanese", "日本語", Japanese),
        ("ko", "Korean", "한국어", Hangul),
    ];

    table
        .iter()
        .map(|&(code, name, native_name, script)| LanguageConfig {
            code,
            name,
            native_name,
            script,
        })
        .collect()
}

impl Script {
    /// Classify a single character, `None` for characters that carry no
    /// script (digits, punctuation, whitespace, symbols).
    pub fn of_char(c: char) -> Option<Script> {
        let script = match c as u32 {
            0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
            0x0370..=0x03FF => Script::Greek,
            0x0400..=0x052F => Script::Cyrillic,
            0x0590..=0x05FF => Script::Hebrew,
            0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
            0x0900..=0x097F => Script::Devanagari,
            0x0E00..=0x0E7F => Script::Thai,
            0x3040..=0x30FF => Script::Japanese,
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => Script::Han,
            0xAC00..=0xD7AF | 0x1100..=0x11FF => Script::Hangul,
            _ if c.is_alphabetic() => Script::Unknown,
            _ => return None,
        };
        Some(script)
    }

    /// Whether text in `other` is plausible output for a language written in `self`.
    pub fn accepts(self, other: Script) -> bool {
        match (self, other) {
            (Script::Unknown, _) | (_, Script::Unknown) => true,
            (Script::Japanese, Script::Han) => true,
            // Brand names and acronyms stay Latin in every script
            (_, Script::Latin) => true,
            (a, b) => a == b,
        }
    }
}
