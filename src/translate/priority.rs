use serde::{Deserialize, Serialize};

/// Rough importance of a key, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

const HIGH_MARKERS: &[&str] = &["error", "user", "form", "auth", "login", "validation"];
const MEDIUM_MARKERS: &[&str] = &["admin", "settings"];

impl Priority {
    /// Classify a dot-path key by the substrings it contains (case-insensitive).
    /// User-facing error and form keys rank above admin screens.
    pub fn of_key(key: &str) -> Priority {
        let lower = key.to_lowercase();
        if HIGH_MARKERS.iter().any(|m| lower.contains(m)) {
            Priority::High
        } else if MEDIUM_MARKERS.iter().any(|m| lower.contains(m)) {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Keep the items whose key has exactly `priority`, preserving order.
pub fn filter_by_priority<T>(items: Vec<T>, priority: Priority, key: impl Fn(&T) -> &str) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| Priority::of_key(key(item)) == priority)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_key() {
        assert_eq!(Priority::of_key("auth.login.title"), Priority::High);
        assert_eq!(Priority::of_key("profile.userName"), Priority::High);
        assert_eq!(Priority::of_key("checkout.formErrors.required"), Priority::High);
        assert_eq!(Priority::of_key("admin.dashboard.title"), Priority::Medium);
        assert_eq!(Priority::of_key("account.settings.save"), Priority::Medium);
        assert_eq!(Priority::of_key("home.hero.title"), Priority::Low);
    }

    #[test]
    fn test_high_wins_over_medium() {
        assert_eq!(Priority::of_key("admin.users.list"), Priority::High);
    }

    #[test]
    fn test_filter_by_priority_keeps_order() {
        let keys = vec!["home.title", "form.name", "admin.title", "errors.generic"];
        let high = filter_by_priority(keys, Priority::High, |k| *k);
        assert_eq!(high, vec!["form.name", "errors.generic"]);
    }

    #[test]
    fn test_priority_serde() {
        let p: Priority = serde_json::from_str(r#""medium""#).unwrap();
        assert_eq!(p, Priority::Medium);
    }
}
