use anyhow::{bail, Result};
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions of source files that may contain JSX and translation calls.
pub const SOURCE_EXTENSIONS: &[&str] = &["tsx", "jsx"];

/// A file that could not be read or written during a scan or rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: String,
    pub error: String,
}

/// Recursively collect `.tsx`/`.jsx` files under `root`, sorted.
///
/// Directories named in `excluded_dirs` are not descended into, wherever
/// they appear in the tree.
pub fn list_source_files(root: &Path, excluded_dirs: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Source directory {} does not exist", root.display());
    }

    let excluded: HashSet<String> = excluded_dirs.iter().cloned().collect();
    let mut files = Vec::new();

    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && entry.depth() > 0 && excluded.contains(&*entry.file_name().to_string_lossy()))
        })
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e));
        if matches_extension {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Path of `path` relative to `root`, with forward slashes.
pub fn display_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Trimmed source line around byte offset `at`, capped for display.
pub(crate) fn context_line(content: &str, at: usize) -> String {
    const MAX_CONTEXT: usize = 160;

    let start = content[..at].rfind('\n').map_or(0, |i| i + 1);
    let end = content[at..].find('\n').map_or(content.len(), |i| at + i);
    let line = content[start..end].trim();
    if line.chars().count() > MAX_CONTEXT {
        let truncated: String = line.chars().take(MAX_CONTEXT).collect();
        format!("{}…", truncated)
    } else {
        line.to_string()
    }
}
