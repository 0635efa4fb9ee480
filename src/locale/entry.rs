//! Nested locale documents and their flattened dot-path form.
//!
//! A locale file is a tree of objects whose leaves are strings. The rest of
//! the crate works on the flattened form (`"auth.login.title" -> "Sign in"`),
//! and `unflatten(flatten(x)) == x` holds for well-formed input (non-empty
//! objects, no dots inside key segments) up to key order.
//!
//! One compatibility accommodation: an object that carries a `title` string
//! next to nested objects keeps that string in a dedicated [`LocaleEntry::Node`]
//! slot. It still flattens to the scalar entry `key.title`, but when a flat
//! map has both `a` and `a.x`, the scalar `a` lands in the same slot instead
//! of being clobbered by the nested object.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

/// Flattened locale keys in file (or reference) order.
pub type FlatKeys = IndexMap<String, String>;

pub const KEY_SEPARATOR: char = '.';
const TITLE_KEY: &str = "title";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleEntry {
    Leaf(String),
    Node {
        /// `title` string kept apart from nested-object siblings.
        title: Option<String>,
        children: IndexMap<String, LocaleEntry>,
    },
}

impl LocaleEntry {
    pub fn empty_node() -> Self {
        LocaleEntry::Node {
            title: None,
            children: IndexMap::new(),
        }
    }

    /// Build a tree from parsed JSON.
    ///
    /// Strings become leaves, other scalars keep their JSON text, arrays
    /// become nodes keyed by index.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => LocaleEntry::Leaf(s.clone()),
            Value::Array(items) => LocaleEntry::Node {
                title: None,
                children: items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), LocaleEntry::from_json(v)))
                    .collect(),
            },
            Value::Object(map) => {
                let children: IndexMap<String, LocaleEntry> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), LocaleEntry::from_json(v)))
                    .collect();
                let mut node = LocaleEntry::Node {
                    title: None,
                    children,
                };
                node.normalize_title();
                node
            }
            other => LocaleEntry::Leaf(other.to_string()),
        }
    }

    /// Render back to JSON. A node's `title` slot is written first.
    pub fn to_json(&self) -> Value {
        match self {
            LocaleEntry::Leaf(s) => Value::String(s.clone()),
            LocaleEntry::Node { title, children } => {
                let mut map = Map::new();
                if let Some(title) = title {
                    map.insert(TITLE_KEY.to_string(), Value::String(title.clone()));
                }
                for (key, child) in children {
                    map.insert(key.clone(), child.to_json());
                }
                Value::Object(map)
            }
        }
    }

    fn has_nested_children(children: &IndexMap<String, LocaleEntry>) -> bool {
        children
            .values()
            .any(|c| matches!(c, LocaleEntry::Node { .. }))
    }

    /// Keep the `title` slot populated exactly when the node has nested
    /// object children, so equal documents compare equal.
    fn normalize_title(&mut self) {
        let LocaleEntry::Node { title, children } = self else {
            return;
        };

        if Self::has_nested_children(children) {
            let title_is_leaf = matches!(children.get(TITLE_KEY), Some(LocaleEntry::Leaf(_)));
            if title.is_none() && title_is_leaf {
                if let Some(LocaleEntry::Leaf(t)) = children.shift_remove(TITLE_KEY) {
                    *title = Some(t);
                }
            }
        } else if let Some(t) = title.take() {
            if children.contains_key(TITLE_KEY) {
                warn!("Dropping duplicate title value {:?}", t);
            } else {
                children.shift_insert(0, TITLE_KEY.to_string(), LocaleEntry::Leaf(t));
            }
        }
    }

    fn normalize_recursive(&mut self) {
        if let LocaleEntry::Node { children, .. } = self {
            for child in children.values_mut() {
                child.normalize_recursive();
            }
        }
        self.normalize_title();
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_SEPARATOR, key)
    }
}

/// Flatten a locale tree into dot-path keys.
pub fn flatten(entry: &LocaleEntry) -> FlatKeys {
    let mut result = FlatKeys::new();
    flatten_into(entry, "", &mut result);
    result
}

fn flatten_into(entry: &LocaleEntry, prefix: &str, result: &mut FlatKeys) {
    match entry {
        LocaleEntry::Leaf(value) => {
            result.insert(prefix.to_string(), value.clone());
        }
        LocaleEntry::Node { title, children } => {
            if let Some(title) = title {
                result.insert(join_key(prefix, TITLE_KEY), title.clone());
            }
            for (key, child) in children {
                flatten_into(child, &join_key(prefix, key), result);
            }
        }
    }
}

/// Flatten a parsed JSON document.
pub fn flatten_json(value: &Value) -> FlatKeys {
    flatten(&LocaleEntry::from_json(value))
}

/// Rebuild a tree from dot-path keys, inserting in iteration order.
///
/// A scalar and a nested object on the same path are reconciled through
/// the node's `title` slot; a second scalar for an occupied slot is dropped.
pub fn unflatten<'a, I>(keys: I) -> LocaleEntry
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut root = LocaleEntry::empty_node();
    for (path, value) in keys {
        let segments: Vec<&str> = path.split(KEY_SEPARATOR).collect();
        insert_path(&mut root, path, &segments, value);
    }
    root.normalize_recursive();
    root
}

fn insert_path(node: &mut LocaleEntry, full_path: &str, segments: &[&str], value: &str) {
    let LocaleEntry::Node { children, .. } = node else {
        return;
    };
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        match children.get_mut(*head) {
            None => {
                children.insert(head.to_string(), LocaleEntry::Leaf(value.to_string()));
            }
            Some(LocaleEntry::Leaf(existing)) => {
                *existing = value.to_string();
            }
            Some(LocaleEntry::Node {
                title: child_title,
                children: grandchildren,
            }) => attach_title(child_title, grandchildren, full_path, value),
        }
        return;
    }

    let child = children
        .entry(head.to_string())
        .or_insert_with(LocaleEntry::empty_node);
    if let LocaleEntry::Leaf(scalar) = child {
        let scalar = std::mem::take(scalar);
        let mut promoted_title = None;
        let mut promoted_children = IndexMap::new();
        attach_title(&mut promoted_title, &mut promoted_children, full_path, &scalar);
        *child = LocaleEntry::Node {
            title: promoted_title,
            children: promoted_children,
        };
    }
    insert_path(child, full_path, rest, value);
}

fn attach_title(
    title: &mut Option<String>,
    children: &mut IndexMap<String, LocaleEntry>,
    path: &str,
    value: &str,
) {
    if title.is_none() && !children.contains_key(TITLE_KEY) {
        warn!(
            "Key '{}' is both a value and a parent; keeping the value as its title",
            path
        );
        *title = Some(value.to_string());
    } else {
        warn!(
            "Key '{}' is both a value and a parent with a title; dropping {:?}",
            path, value
        );
    }
}
