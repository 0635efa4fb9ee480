use crate::locale::entry::{flatten_json, unflatten, FlatKeys, KEY_SEPARATOR};
use crate::locale::registry::LanguageRegistry;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// One locale file, flattened.
#[derive(Debug, Clone, Serialize)]
pub struct Locale {
    pub code: String,
    pub display_name: String,
    pub keys: FlatKeys,
    pub total_keys: usize,
}

impl Locale {
    fn new(code: &str, keys: FlatKeys) -> Self {
        Self {
            code: code.to_string(),
            display_name: LanguageRegistry::get().display_name(code),
            total_keys: keys.len(),
            keys,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocaleSummary {
    pub code: String,
    pub display_name: String,
    pub total_keys: usize,
    pub is_reference: bool,
}

/// In-memory cache of every locale file in the messages directory.
///
/// Writes go straight to disk and then to the cache. There is no file
/// locking; one writer per locale is enforced by the translation job
/// registry, not here.
#[derive(Debug)]
pub struct LocaleStore {
    messages_dir: PathBuf,
    reference: String,
    locales: RwLock<BTreeMap<String, Locale>>,
}

impl LocaleStore {
    pub fn new(messages_dir: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            messages_dir: messages_dir.into(),
            reference: reference.into(),
            locales: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store and load it immediately.
    pub fn open(messages_dir: impl Into<PathBuf>, reference: impl Into<String>) -> Result<Self> {
        let store = Self::new(messages_dir, reference);
        store.load()?;
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Locale>> {
        self.locales.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Locale>> {
        self.locales.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn messages_dir(&self) -> &Path {
        &self.messages_dir
    }

    pub fn reference_code(&self) -> &str {
        &self.reference
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        self.messages_dir.join(format!("{}.json", code))
    }

    /// Read every `*.json` file in the messages directory, replacing the cache.
    ///
    /// A file that cannot be read or parsed is logged and skipped. Returns the
    /// number of locales loaded.
    pub fn load(&self) -> Result<usize> {
        let entries = std::fs::read_dir(&self.messages_dir).with_context(|| {
            format!(
                "Failed to read messages directory {}",
                self.messages_dir.display()
            )
        })?;

        let mut loaded = BTreeMap::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // A file that could be loaded but never saved back is not a locale
            if let Err(e) = validate_code(code) {
                warn!("Skipping {}: {:#}", path.display(), e);
                continue;
            }

            match read_locale_file(&path) {
                Ok(keys) => {
                    debug!("Loaded {} keys for locale {}", keys.len(), code);
                    loaded.insert(code.to_string(), Locale::new(code, keys));
                }
                Err(e) => warn!("Skipping locale file {}: {:#}", path.display(), e),
            }
        }

        if !loaded.contains_key(&self.reference) {
            warn!(
                "Reference locale '{}' not found in {}",
                self.reference,
                self.messages_dir.display()
            );
        }

        let count = loaded.len();
        *self.write() = loaded;
        info!("Loaded {} locales from {}", count, self.messages_dir.display());
        Ok(count)
    }

    pub fn codes(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.read().contains_key(code)
    }

    pub fn summaries(&self) -> Vec<LocaleSummary> {
        self.read()
            .values()
            .map(|locale| LocaleSummary {
                code: locale.code.clone(),
                display_name: locale.display_name.clone(),
                total_keys: locale.total_keys,
                is_reference: locale.code == self.reference,
            })
            .collect()
    }

    pub fn get(&self, code: &str) -> Option<Locale> {
        self.read().get(code).cloned()
    }

    pub fn keys(&self, code: &str) -> Option<FlatKeys> {
        self.read().get(code).map(|l| l.keys.clone())
    }

    /// Keys of the reference locale, empty when it is not loaded.
    pub fn reference_keys(&self) -> FlatKeys {
        self.keys(&self.reference).unwrap_or_default()
    }

    /// Key sets of all locales, for membership checks.
    pub fn key_sets(&self) -> HashMap<String, Vec<String>> {
        self.read()
            .iter()
            .map(|(code, locale)| (code.clone(), locale.keys.keys().cloned().collect()))
            .collect()
    }

    /// Persist a locale from its flattened keys and refresh the cache.
    ///
    /// Keys are written shallowest first, then in reference order, with keys
    /// unknown to the reference appended in their own order.
    pub fn save(&self, code: &str, keys: FlatKeys) -> Result<()> {
        validate_code(code)?;

        let reference_order: HashMap<String, usize> = {
            let guard = self.read();
            let reference = guard.get(&self.reference).map(|l| &l.keys).unwrap_or(&keys);
            reference
                .keys()
                .enumerate()
                .map(|(i, k)| (k.clone(), i))
                .collect()
        };

        let ordered = order_for_save(&keys, &reference_order);
        let tree = unflatten(ordered);
        let mut content = serde_json::to_string_pretty(&tree.to_json())
            .context("Failed to serialize locale")?;
        content.push('\n');

        std::fs::create_dir_all(&self.messages_dir).with_context(|| {
            format!("Failed to create {}", self.messages_dir.display())
        })?;
        let path = self.path_for(code);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Saved {} keys to {}", keys.len(), path.display());
        self.write().insert(code.to_string(), Locale::new(code, keys));
        Ok(())
    }

    /// Merge `updates` into a locale (creating it if needed) and save.
    pub fn update_keys(&self, code: &str, updates: &[(String, String)]) -> Result<()> {
        let mut keys = self.keys(code).unwrap_or_default();
        for (key, value) in updates {
            keys.insert(key.clone(), value.clone());
        }
        self.save(code, keys)
    }

    /// Remove keys from a locale and save. Returns how many were present.
    pub fn remove_keys(&self, code: &str, remove: &[String]) -> Result<usize> {
        let Some(mut keys) = self.keys(code) else {
            bail!("Unknown locale '{}'", code);
        };
        let before = keys.len();
        keys.retain(|k, _| !remove.contains(k));
        let removed = before - keys.len();
        if removed > 0 {
            self.save(code, keys)?;
        }
        Ok(removed)
    }
}

fn read_locale_file(path: &Path) -> Result<FlatKeys> {
    let content = std::fs::read_to_string(path).context("Failed to read file")?;
    let value: serde_json::Value = serde_json::from_str(&content).context("Invalid JSON")?;
    if !value.is_object() {
        bail!("Top-level value is not an object");
    }
    Ok(flatten_json(&value))
}

/// Locale codes become file names, so only plain tags are accepted.
fn validate_code(code: &str) -> Result<()> {
    let valid = !code.is_empty()
        && code.len() <= 16
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        bail!("Invalid locale code '{}'", code);
    }
    Ok(())
}

fn key_depth(key: &str) -> usize {
    key.split(KEY_SEPARATOR).count()
}

fn order_for_save<'a>(
    keys: &'a FlatKeys,
    reference_order: &HashMap<String, usize>,
) -> Vec<(&'a String, &'a String)> {
    let mut ordered: Vec<(usize, (&String, &String))> = keys.iter().enumerate().collect();
    ordered.sort_by_key(|(own_index, (key, _))| {
        (
            key_depth(key),
            reference_order.get(*key).copied().unwrap_or(usize::MAX),
            *own_index,
        )
    });
    ordered.into_iter().map(|(_, kv)| kv).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).expect("write fixture");
    }

    fn flat(pairs: &[(&str, &str)]) -> FlatKeys {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_flattens_and_counts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en.json", r#"{"common":{"save":"Save","cancel":"Cancel"},"title":"App"}"#);
        write(&dir, "es.json", r#"{"common":{"save":"Guardar"}}"#);

        let store = LocaleStore::open(dir.path(), "en").unwrap();
        assert_eq!(store.codes(), vec!["en", "es"]);

        let en = store.get("en").unwrap();
        assert_eq!(en.total_keys, 3);
        assert_eq!(en.display_name, "English");
        assert_eq!(en.keys.get("common.cancel"), Some(&"Cancel".to_string()));
    }

    #[test]
    fn test_load_skips_malformed_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en.json", r#"{"a":"A"}"#);
        write(&dir, "fr.json", r#"{"a": "#);
        write(&dir, "notes.txt", "ignored");

        let store = LocaleStore::new(dir.path(), "en");
        assert_eq!(store.load().unwrap(), 1);
        assert!(store.contains("en"));
        assert!(!store.contains("fr"));
    }

    #[test]
    fn test_load_skips_files_with_invalid_codes() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en.json", r#"{"a":"A"}"#);
        write(&dir, "zz.bak.json", r#"{"a":"A"}"#);
        write(&dir, "my locale.json", r#"{"a":"A"}"#);

        let store = LocaleStore::open(dir.path(), "en").unwrap();
        assert_eq!(store.codes(), vec!["en"]);
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = LocaleStore::new(dir.path().join("missing"), "en");
        assert!(store.load().is_err());
    }

    #[test]
    fn test_save_follows_reference_order() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "en.json",
            r#"{"nav":{"home":"Home","about":"About"},"footer":"Footer"}"#,
        );
        let store = LocaleStore::open(dir.path(), "en").unwrap();

        let keys = flat(&[
            ("extra.note", "Nota"),
            ("nav.about", "Acerca"),
            ("footer", "Pie"),
            ("nav.home", "Inicio"),
        ]);
        store.save("es", keys).unwrap();

        let written = std::fs::read_to_string(dir.path().join("es.json")).unwrap();
        let footer = written.find("\"footer\"").unwrap();
        let nav = written.find("\"nav\"").unwrap();
        let home = written.find("\"home\"").unwrap();
        let about = written.find("\"about\"").unwrap();
        let extra = written.find("\"extra\"").unwrap();

        // Shallow keys first, then reference order, then extras
        assert!(footer < nav);
        assert!(home < about);
        assert!(nav < extra);
        assert!(written.ends_with("}\n"));
    }

    #[test]
    fn test_save_updates_cache_and_reloads_identically() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en.json", r#"{"a":{"b":"B"}}"#);
        let store = LocaleStore::open(dir.path(), "en").unwrap();

        store
            .update_keys("de", &[("a.b".to_string(), "Be".to_string())])
            .unwrap();
        assert_eq!(store.get("de").unwrap().total_keys, 1);

        store.load().unwrap();
        assert_eq!(store.keys("de").unwrap(), flat(&[("a.b", "Be")]));
    }

    #[test]
    fn test_save_rejects_path_like_code() {
        let dir = TempDir::new().unwrap();
        let store = LocaleStore::new(dir.path(), "en");
        assert!(store.save("../evil", FlatKeys::new()).is_err());
    }

    #[test]
    fn test_remove_keys() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en.json", r#"{"a":"A","b":"B","c":"C"}"#);
        let store = LocaleStore::open(dir.path(), "en").unwrap();

        let removed = store
            .remove_keys("en", &["b".to_string(), "zzz".to_string()])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.keys("en").unwrap(), flat(&[("a", "A"), ("c", "C")]));
        assert!(store.remove_keys("xx", &[]).is_err());
    }

    #[test]
    fn test_order_for_save_depth_then_reference() {
        let keys = flat(&[("x.y.z", "1"), ("b", "2"), ("a.c", "3"), ("a.b", "4")]);
        let reference: HashMap<String, usize> = ["a.b", "a.c", "b"]
            .iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), i))
            .collect();

        let order: Vec<&str> = order_for_save(&keys, &reference)
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(order, vec!["b", "a.b", "a.c", "x.y.z"]);
    }
}
