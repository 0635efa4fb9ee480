use crate::locale::FlatKeys;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueChange {
    pub key: String,
    pub source: String,
    pub target: String,
}

/// Key-set comparison of a target locale against a source locale.
///
/// `missing`, `identical` and `different` partition the source key space;
/// `extra` lists target keys the source does not have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocaleDiff {
    pub missing: Vec<KeyValue>,
    pub identical: Vec<KeyValue>,
    pub different: Vec<ValueChange>,
    pub extra: Vec<KeyValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    pub source_keys: usize,
    pub missing: usize,
    pub identical: usize,
    pub different: usize,
    pub extra: usize,
}

impl LocaleDiff {
    pub fn counts(&self) -> DiffCounts {
        DiffCounts {
            source_keys: self.missing.len() + self.identical.len() + self.different.len(),
            missing: self.missing.len(),
            identical: self.identical.len(),
            different: self.different.len(),
            extra: self.extra.len(),
        }
    }

    pub fn missing_keys(&self) -> Vec<String> {
        self.missing.iter().map(|kv| kv.key.clone()).collect()
    }

    /// Share of source keys present in the target, as a percentage.
    pub fn completeness(&self) -> f64 {
        let counts = self.counts();
        if counts.source_keys == 0 {
            return 100.0;
        }
        let present = counts.source_keys - counts.missing;
        (present as f64 / counts.source_keys as f64) * 100.0
    }
}

/// Compare `target` against `source`, in source key order.
pub fn diff(source: &FlatKeys, target: &FlatKeys) -> LocaleDiff {
    let mut result = LocaleDiff::default();

    for (key, source_value) in source {
        match target.get(key) {
            None => result.missing.push(KeyValue::new(key, source_value)),
            Some(target_value) if target_value == source_value => {
                result.identical.push(KeyValue::new(key, source_value))
            }
            Some(target_value) => result.different.push(ValueChange {
                key: key.clone(),
                source: source_value.clone(),
                target: target_value.clone(),
            }),
        }
    }

    result.extra = target
        .iter()
        .filter(|(key, _)| !source.contains_key(*key))
        .map(|(key, value)| KeyValue::new(key, value))
        .collect();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(pairs: &[(&str, &str)]) -> FlatKeys {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_diff_partitions_source_keys() {
        let en = flat(&[
            ("common.save", "Save"),
            ("common.cancel", "Cancel"),
            ("common.ok", "OK"),
            ("nav.home", "Home"),
        ]);
        let es = flat(&[
            ("common.save", "Guardar"),
            ("common.ok", "OK"),
            ("legacy.old", "Viejo"),
        ]);

        let result = diff(&en, &es);

        assert_eq!(result.missing_keys(), vec!["common.cancel", "nav.home"]);
        assert_eq!(result.identical, vec![KeyValue::new("common.ok", "OK")]);
        assert_eq!(result.different.len(), 1);
        assert_eq!(result.different[0].target, "Guardar");
        assert_eq!(result.extra, vec![KeyValue::new("legacy.old", "Viejo")]);
    }

    #[test]
    fn test_diff_counts_add_up() {
        // N = 10 reference keys, M = 4 missing from the target
        let en: FlatKeys = (0..10)
            .map(|i| (format!("k{}", i), format!("Value {}", i)))
            .collect();
        let target: FlatKeys = (4..10)
            .map(|i| {
                let value = if i % 2 == 0 {
                    format!("Value {}", i)
                } else {
                    format!("Valor {}", i)
                };
                (format!("k{}", i), value)
            })
            .collect();

        let counts = diff(&en, &target).counts();
        assert_eq!(counts.missing, 4);
        assert_eq!(counts.identical + counts.different, 6);
        assert_eq!(counts.source_keys, 10);
    }

    #[test]
    fn test_diff_empty_target() {
        let en = flat(&[("a", "A"), ("b", "B")]);
        let result = diff(&en, &FlatKeys::new());
        assert_eq!(result.missing.len(), 2);
        assert!(result.identical.is_empty());
        assert_eq!(result.completeness(), 0.0);
    }

    #[test]
    fn test_completeness_of_empty_source() {
        let result = diff(&FlatKeys::new(), &flat(&[("a", "A")]));
        assert_eq!(result.completeness(), 100.0);
        assert_eq!(result.extra.len(), 1);
    }
}
