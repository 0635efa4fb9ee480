//! Comparison of locale key sets against the reference locale.

mod diff;
mod identical;
mod untranslatable;

pub use diff::{diff, DiffCounts, KeyValue, LocaleDiff, ValueChange};
pub use identical::{
    extract_placeholders, find_identical_values, is_placeholder_only, IdenticalFilter,
    IdenticalFilterConfig,
};
pub use untranslatable::{
    find_non_translatable, CompiledPattern, NonTranslatable, ReplacementPolicy,
    UntranslatableConfig, UntranslatableConfigStore, UntranslatablePattern,
};
