//! Frontend source scanning and rewriting.
//!
//! - `files`: enumeration of `.tsx`/`.jsx` sources
//! - `usage`: translation key references in code
//! - `wrappers`: redundant `{"text"}` JSX wrappers
//! - `rewrite`: file and locale mutations driven by the scans

mod files;
mod rewrite;
mod usage;
mod wrappers;

pub use files::{display_path, list_source_files, FileError, SOURCE_EXTENSIONS};
pub use rewrite::{
    clean_untranslatable, clean_wrappers, humanize, restore_keys, FileChange, RestoreReport,
    RewriteReport, UntranslatableCleanReport, UntranslatableReplacement,
};
pub use usage::{
    find_binding, missing_in_code, orphaned_in_code, scan_content, scan_for_usage, KeyReference,
    KeyUsage, TranslatorBinding, UsageMap, UsageScan,
};
pub use wrappers::{
    find_wrappers, scan_for_redundant_wrappers, WrapperFinding, WrapperMatch, WrapperPosition,
    WrapperScan,
};
