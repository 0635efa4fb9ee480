//! Translation key usage in source files.
//!
//! Each file is expected to bind a translator once, e.g.
//! `const t = useTranslations("wallet")`, and then call it with literal keys:
//! `t("deposit.title")` resolves to `wallet.deposit.title`. Only the first
//! binding in a file is used. Dynamic keys (template literals with
//! interpolation, variables) are not resolvable and are ignored.

use crate::compare::KeyValue;
use crate::locale::{FlatKeys, KEY_SEPARATOR};
use crate::scanner::files::{context_line, display_path, FileError};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

const MAX_EXAMPLES: usize = 3;

/// Where a resolved key is referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyUsage {
    pub full_key: String,
    pub namespace: String,
    pub files: BTreeSet<String>,
    pub example_contexts: Vec<String>,
}

/// Usage records keyed by full key.
pub type UsageMap = BTreeMap<String, KeyUsage>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageScan {
    pub usages: UsageMap,
    pub files_scanned: usize,
    pub files_with_translations: usize,
    pub errors: Vec<FileError>,
}

/// The translator variable bound in a file and its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorBinding {
    pub variable: String,
    pub namespace: String,
}

impl TranslatorBinding {
    pub fn full_key(&self, key: &str) -> String {
        if self.namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", self.namespace, KEY_SEPARATOR, key)
        }
    }

    /// Inverse of [`full_key`](Self::full_key): the key as written in this file.
    pub fn local_key<'a>(&self, full_key: &'a str) -> Option<&'a str> {
        if self.namespace.is_empty() {
            return Some(full_key);
        }
        full_key
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
    }

    /// Regex matching calls of this binding with a literal key. The key is
    /// in capture group 1, 2 or 3 depending on the quote style.
    pub fn call_regex(&self) -> Regex {
        let pattern = format!(
            r#"(?:^|[^\w.$]){}(?:\.(?:rich|raw|markup))?\(\s*(?:"([^"\n]+)"|'([^'\n]+)'|`([^`$\n]+)`)"#,
            regex::escape(&self.variable)
        );
        // An escaped identifier always yields a valid pattern
        Regex::new(&pattern).unwrap()
    }
}

static BINDING_REGEX: OnceLock<Regex> = OnceLock::new();

fn binding_regex() -> &'static Regex {
    BINDING_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?:const|let|var)\s+(?:\{\s*(\w+)\s*\}|(\w+))\s*=\s*(?:await\s+)?(?:useTranslations|getTranslations|useTranslation)\(\s*(?:"([^"]*)"|'([^']*)'|`([^`$]*)`)?"#,
        )
        .unwrap()
    })
}

/// First translator binding declared in `content`.
pub fn find_binding(content: &str) -> Option<TranslatorBinding> {
    let caps = binding_regex().captures(content)?;
    let variable = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();
    let namespace = caps
        .get(3)
        .or_else(|| caps.get(4))
        .or_else(|| caps.get(5))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    Some(TranslatorBinding {
        variable,
        namespace,
    })
}

/// A resolved call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReference {
    pub full_key: String,
    pub namespace: String,
    pub context: String,
}

/// Every literal-key call of the file's translator binding.
pub fn scan_content(content: &str) -> Vec<KeyReference> {
    let Some(binding) = find_binding(content) else {
        return Vec::new();
    };

    binding
        .call_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let key = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            Some(KeyReference {
                full_key: binding.full_key(key.as_str()),
                namespace: binding.namespace.clone(),
                context: context_line(content, key.start()),
            })
        })
        .collect()
}

/// Collect key usage across `files`. Unreadable files are recorded and skipped.
pub fn scan_for_usage(root: &Path, files: &[PathBuf]) -> UsageScan {
    let mut scan = UsageScan::default();

    for path in files {
        let shown = display_path(root, path);
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", shown, e);
                scan.errors.push(FileError {
                    path: shown,
                    error: e.to_string(),
                });
                continue;
            }
        };
        scan.files_scanned += 1;

        let references = scan_content(&content);
        if references.is_empty() {
            continue;
        }
        scan.files_with_translations += 1;

        for reference in references {
            let usage = scan
                .usages
                .entry(reference.full_key.clone())
                .or_insert_with(|| KeyUsage {
                    full_key: reference.full_key.clone(),
                    namespace: reference.namespace.clone(),
                    files: BTreeSet::new(),
                    example_contexts: Vec::new(),
                });
            usage.files.insert(shown.clone());
            if usage.example_contexts.len() < MAX_EXAMPLES
                && !usage.example_contexts.contains(&reference.context)
            {
                usage.example_contexts.push(reference.context);
            }
        }
    }

    scan
}

/// Keys referenced in code that no locale defines.
pub fn orphaned_in_code(usages: &UsageMap, key_sets: &HashMap<String, Vec<String>>) -> Vec<KeyUsage> {
    let known: HashSet<&str> = key_sets
        .values()
        .flat_map(|keys| keys.iter().map(String::as_str))
        .collect();

    usages
        .values()
        .filter(|usage| !known.contains(usage.full_key.as_str()))
        .cloned()
        .collect()
}

/// Reference keys that no source file references, in reference order.
pub fn missing_in_code(reference: &FlatKeys, usages: &UsageMap) -> Vec<KeyValue> {
    reference
        .iter()
        .filter(|(key, _)| !usages.contains_key(*key))
        .map(|(key, value)| KeyValue::new(key, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"
import { useTranslations } from "next-intl";

export default function WalletPage() {
  const t = useTranslations("wallet");
  return (
    <div title={t("tooltip")}>
      <h1>{t("title")}</h1>
      <p>{t.rich('deposit.help', { b: (c) => <b>{c}</b> })}</p>
      <span>{format(t(`dynamic.${kind}`))}</span>
      <span>{i18n.t("elsewhere")}</span>
    </div>
  );
}
"#;

    #[test]
    fn test_find_binding_variants() {
        assert_eq!(
            find_binding(r#"const t = useTranslations("nav");"#),
            Some(TranslatorBinding {
                variable: "t".to_string(),
                namespace: "nav".to_string()
            })
        );
        assert_eq!(
            find_binding(r#"const tr = await getTranslations('admin.users')"#)
                .unwrap()
                .namespace,
            "admin.users"
        );
        assert_eq!(
            find_binding(r#"const { t } = useTranslation();"#).unwrap(),
            TranslatorBinding {
                variable: "t".to_string(),
                namespace: String::new()
            }
        );
        assert!(find_binding("const x = useState(0);").is_none());
    }

    #[test]
    fn test_scan_content_resolves_keys() {
        let keys: Vec<String> = scan_content(PAGE).into_iter().map(|r| r.full_key).collect();
        assert_eq!(
            keys,
            vec!["wallet.tooltip", "wallet.title", "wallet.deposit.help"]
        );
    }

    #[test]
    fn test_scan_content_without_binding() {
        assert!(scan_content(r#"<p>{t("orphan")}</p>"#).is_empty());
    }

    #[test]
    fn test_local_key_roundtrip() {
        let binding = TranslatorBinding {
            variable: "t".to_string(),
            namespace: "wallet".to_string(),
        };
        assert_eq!(binding.local_key("wallet.deposit.title"), Some("deposit.title"));
        assert_eq!(binding.local_key("walletx.title"), None);
        assert_eq!(binding.local_key("nav.home"), None);
    }

    #[test]
    fn test_scan_for_usage_merges_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("a.tsx"), PAGE).unwrap();
        std::fs::write(
            root.join("b.tsx"),
            r#"const t = useTranslations("wallet"); <h2>{t("title")}</h2>"#,
        )
        .unwrap();
        std::fs::write(root.join("c.tsx"), "export const x = 1;").unwrap();

        let files = vec![
            root.join("a.tsx"),
            root.join("b.tsx"),
            root.join("c.tsx"),
            root.join("gone.tsx"),
        ];
        let scan = scan_for_usage(root, &files);

        assert_eq!(scan.files_scanned, 3);
        assert_eq!(scan.files_with_translations, 2);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].path, "gone.tsx");

        let title = &scan.usages["wallet.title"];
        assert_eq!(title.namespace, "wallet");
        assert_eq!(
            title.files.iter().cloned().collect::<Vec<_>>(),
            vec!["a.tsx", "b.tsx"]
        );
        assert_eq!(title.example_contexts.len(), 2);
    }

    #[test]
    fn test_orphaned_and_missing_in_code() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.tsx"), PAGE).unwrap();
        let scan = scan_for_usage(dir.path(), &[dir.path().join("a.tsx")]);

        let mut key_sets = HashMap::new();
        key_sets.insert(
            "en".to_string(),
            vec!["wallet.title".to_string(), "wallet.unused".to_string()],
        );
        key_sets.insert("es".to_string(), vec!["wallet.tooltip".to_string()]);

        let orphaned: Vec<_> = orphaned_in_code(&scan.usages, &key_sets)
            .into_iter()
            .map(|u| u.full_key)
            .collect();
        assert_eq!(orphaned, vec!["wallet.deposit.help"]);

        let reference: FlatKeys = [("wallet.title", "Wallet"), ("wallet.unused", "Unused")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let missing = missing_in_code(&reference, &scan.usages);
        assert_eq!(missing, vec![KeyValue::new("wallet.unused", "Unused")]);
    }
}
