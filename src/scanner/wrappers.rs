//! Redundant JSX string wrappers: `{"text"}` and `{'text'}` holding a plain
//! literal with no interpolation.
//!
//! In attribute position (`placeholder={"Search"}`) the braces can go,
//! leaving `placeholder="Search"`. In child position (`<b>{"Total"}</b>`)
//! the literal can become bare text, unless JSX would then read it
//! differently (surrounding whitespace is collapsed, `&` starts an entity).

use crate::scanner::files::{context_line, display_path, FileError};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperPosition {
    Attribute,
    Child,
}

/// One wrapper occurrence inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperMatch {
    pub range: Range<usize>,
    pub value: String,
    pub quote: char,
    pub position: WrapperPosition,
}

impl WrapperMatch {
    /// Text that replaces `range`, or `None` when unwrapping would change
    /// how the value renders.
    pub fn replacement(&self) -> Option<String> {
        match self.position {
            WrapperPosition::Attribute => Some(format!("={q}{}{q}", self.value, q = self.quote)),
            WrapperPosition::Child => is_safe_jsx_text(&self.value).then(|| self.value.clone()),
        }
    }
}

/// All occurrences of one wrapped value in one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperFinding {
    pub value: String,
    pub position: WrapperPosition,
    pub suggestion: String,
    pub count: usize,
    pub files: BTreeSet<String>,
    pub example_contexts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WrapperScan {
    pub findings: Vec<WrapperFinding>,
    pub files_scanned: usize,
    pub errors: Vec<FileError>,
}

static WRAPPER_REGEX: OnceLock<Regex> = OnceLock::new();

fn wrapper_regex() -> &'static Regex {
    WRAPPER_REGEX.get_or_init(|| {
        Regex::new(r#"(=\s*)?\{\s*(?:"([^"\\\n{}$`]*)"|'([^'\\\n{}$`]*)')\s*\}"#).unwrap()
    })
}

/// True when `text` can stand as a bare JSX child and render the same.
pub(crate) fn is_safe_jsx_text(text: &str) -> bool {
    !text.is_empty()
        && text.trim() == text
        && !text.contains("  ")
        && !text.contains(['\n', '&', '<', '>', '{', '}'])
}

/// A child wrapper must follow a tag close, another expression or text.
/// Anything else (`(`, `,`, `?`, operators) means a JS expression context.
fn follows_jsx_child(before: &str) -> bool {
    match before.trim_end().chars().last() {
        Some(c) => c == '>' || c == '}' || c.is_alphanumeric() || c == '.' || c == '!',
        None => false,
    }
}

/// Wrapper occurrences in `content`, in source order.
pub fn find_wrappers(content: &str) -> Vec<WrapperMatch> {
    wrapper_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (value, quote) = match (caps.get(2), caps.get(3)) {
                (Some(v), _) => (v.as_str(), '"'),
                (None, Some(v)) => (v.as_str(), '\''),
                (None, None) => return None,
            };
            let position = if caps.get(1).is_some() {
                WrapperPosition::Attribute
            } else if follows_jsx_child(&content[..whole.start()]) {
                WrapperPosition::Child
            } else {
                return None;
            };
            Some(WrapperMatch {
                range: whole.range(),
                value: value.to_string(),
                quote,
                position,
            })
        })
        .collect()
}

/// Group redundant wrappers across `files` by value and position.
///
/// Child wrappers that cannot be safely unwrapped are not reported.
pub fn scan_for_redundant_wrappers(root: &Path, files: &[PathBuf]) -> WrapperScan {
    let mut scan = WrapperScan::default();
    let mut grouped: BTreeMap<(String, WrapperPosition), WrapperFinding> = BTreeMap::new();

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

        for found in find_wrappers(&content) {
            let Some(suggestion) = found.replacement() else {
                continue;
            };
            let finding = grouped
                .entry((found.value.clone(), found.position))
                .or_insert_with(|| WrapperFinding {
                    value: found.value.clone(),
                    position: found.position,
                    suggestion,
                    count: 0,
                    files: BTreeSet::new(),
                    example_contexts: Vec::new(),
                });
            finding.count += 1;
            finding.files.insert(shown.clone());
            let context = context_line(&content, found.range.start);
            if finding.example_contexts.len() < MAX_EXAMPLES
                && !finding.example_contexts.contains(&context)
            {
                finding.example_contexts.push(context);
            }
        }
    }

    scan.findings = grouped.into_values().collect();
    scan.findings.sort_by(|a, b| b.count.cmp(&a.count));
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FORM: &str = r#"
export function SearchForm({ query }) {
  return (
    <form>
      <input placeholder={"Search"} aria-label={'Search box'} />
      <button>{"Go"}</button>
      <span>{" - "}</span>
      <span>{"Tom & Jerry"}</span>
      <p>{`Hello ${query}`}</p>
      <p>{"Hi {name}"}</p>
      {cond ? "a" : "b"}
      {items.map(() => ({"x"}))}
    </form>
  );
}
"#;

    #[test]
    fn test_find_wrappers_positions() {
        let found = find_wrappers(FORM);
        let summary: Vec<_> = found
            .iter()
            .map(|m| (m.value.as_str(), m.position))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Search", WrapperPosition::Attribute),
                ("Search box", WrapperPosition::Attribute),
                ("Go", WrapperPosition::Child),
                (" - ", WrapperPosition::Child),
                ("Tom & Jerry", WrapperPosition::Child),
            ]
        );
    }

    #[test]
    fn test_replacements_keep_quote_and_skip_unsafe_children() {
        let found = find_wrappers(FORM);
        let replacements: Vec<_> = found.iter().map(WrapperMatch::replacement).collect();
        assert_eq!(
            replacements,
            vec![
                Some(r#"="Search""#.to_string()),
                Some("='Search box'".to_string()),
                Some("Go".to_string()),
                None,
                None,
            ]
        );
    }

    #[test]
    fn test_is_safe_jsx_text() {
        assert!(is_safe_jsx_text("Save changes"));
        assert!(!is_safe_jsx_text(""));
        assert!(!is_safe_jsx_text(" padded"));
        assert!(!is_safe_jsx_text("a  b"));
        assert!(!is_safe_jsx_text("R&D"));
        assert!(!is_safe_jsx_text("a > b"));
    }

    #[test]
    fn test_scan_groups_by_value_and_position() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("a.tsx"), FORM).unwrap();
        std::fs::write(
            root.join("b.tsx"),
            "<div>\n  <button type=\"submit\">{\"Go\"}</button>\n  <Link title={\"Go\"} />\n</div>\n",
        )
        .unwrap();

        let scan = scan_for_redundant_wrappers(root, &[root.join("a.tsx"), root.join("b.tsx")]);
        assert_eq!(scan.files_scanned, 2);

        let go_child = scan
            .findings
            .iter()
            .find(|f| f.value == "Go" && f.position == WrapperPosition::Child)
            .unwrap();
        assert_eq!(go_child.count, 2);
        assert_eq!(go_child.files.len(), 2);
        assert_eq!(go_child.suggestion, "Go");
        assert_eq!(go_child.example_contexts.len(), 2);

        let go_attr = scan
            .findings
            .iter()
            .find(|f| f.value == "Go" && f.position == WrapperPosition::Attribute)
            .unwrap();
        assert_eq!(go_attr.count, 1);
        assert_eq!(go_attr.suggestion, r#"="Go""#);

        assert!(scan.findings.iter().all(|f| f.value != " - "));
        assert_eq!(scan.findings[0].count, 2);
    }
}
