//! Locale files: loading, flattening and persisting translation key maps.
//!
//! - `entry`: nested locale tree and the flatten/unflatten conversion
//! - `store`: the cached set of locale files and ordered writes
//! - `registry`: display names and expected scripts per locale code

mod entry;
mod registry;
mod store;

pub use entry::{flatten, flatten_json, unflatten, FlatKeys, LocaleEntry, KEY_SEPARATOR};
pub use registry::{LanguageConfig, LanguageRegistry, Script};
pub use store::{Locale, LocaleStore, LocaleSummary};
