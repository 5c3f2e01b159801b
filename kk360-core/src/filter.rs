//! Filter predicates for derived list views
//!
//! Filters are independent, user-controlled predicates keyed by name (status,
//! class, search text). An item is visible only if it matches every active
//! filter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel used by select-style filters to mean "no restriction".
pub const ALL: &str = "all";

/// Value of a single filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    /// Field equals value, ignoring surrounding whitespace and ASCII case
    /// (for list fields: any element equals value)
    Equals(String),
    /// Case-insensitive substring over the item's searchable fields
    Search(String),
}

impl FilterValue {
    /// Create an equality filter.
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(value.into())
    }

    /// Create a search filter.
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search(query.into())
    }

    /// Whether this value places no restriction on the view.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Equals(value) => {
                let value = value.trim();
                value.is_empty() || value.eq_ignore_ascii_case(ALL)
            }
            Self::Search(query) => query.trim().is_empty(),
        }
    }

    /// Evaluate against one item for the given filter key.
    pub fn matches<T: Filterable + ?Sized>(&self, field: &str, item: &T) -> bool {
        if self.is_default() {
            return true;
        }
        match self {
            Self::Equals(expected) => {
                let expected = expected.trim();
                item.field_values(field)
                    .iter()
                    .any(|value| value.trim().eq_ignore_ascii_case(expected))
            }
            Self::Search(query) => {
                let needle = query.trim().to_lowercase();
                item.search_fields()
                    .iter()
                    .any(|haystack| haystack.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Per-resource declaration of filterable and searchable fields.
pub trait Filterable {
    /// Values of a named field. Unknown fields return an empty list, which
    /// never matches an equality filter.
    fn field_values(&self, field: &str) -> Vec<&str>;

    /// Fixed set of fields that text search looks at.
    fn search_fields(&self) -> Vec<&str>;
}

/// Active filters keyed by name, evaluated conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: FilterValue) {
        self.filters.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.filters.remove(key)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    /// Filters that actually restrict the view.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters
            .iter()
            .filter(|(_, value)| !value.is_default())
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    pub fn matches<T: Filterable + ?Sized>(&self, item: &T) -> bool {
        self.active().all(|(key, value)| value.matches(key, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        status: &'static str,
        subjects: Vec<&'static str>,
        name: &'static str,
        email: &'static str,
    }

    impl Filterable for Row {
        fn field_values(&self, field: &str) -> Vec<&str> {
            match field {
                "status" => vec![self.status],
                "subject" => self.subjects.clone(),
                _ => Vec::new(),
            }
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.name, self.email]
        }
    }

    fn row() -> Row {
        Row {
            status: "selected",
            subjects: vec!["Maths", "Physics"],
            name: "Priya Kumar",
            email: "priya@example.org",
        }
    }

    #[test]
    fn test_default_values_match_everything() {
        assert!(FilterValue::equals("all").is_default());
        assert!(FilterValue::equals("ALL").is_default());
        assert!(FilterValue::equals("  ").is_default());
        assert!(FilterValue::search("").is_default());
        assert!(FilterValue::equals("all").matches("status", &row()));
    }

    #[test]
    fn test_equals_on_list_field_is_membership() {
        assert!(FilterValue::equals("Physics").matches("subject", &row()));
        assert!(!FilterValue::equals("Chemistry").matches("subject", &row()));
    }

    #[test]
    fn test_equals_ignores_case_and_padding() {
        assert!(FilterValue::equals("Selected").matches("status", &row()));
        assert!(FilterValue::equals(" SELECTED ").matches("status", &row()));
        assert!(FilterValue::equals("maths").matches("subject", &row()));
        assert!(!FilterValue::equals("select").matches("status", &row()));
    }

    #[test]
    fn test_unknown_field_never_matches() {
        assert!(!FilterValue::equals("x").matches("nope", &row()));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        assert!(FilterValue::search("KUMAR").matches("search", &row()));
        assert!(FilterValue::search("Example.ORG").matches("search", &row()));
        assert!(!FilterValue::search("sharma").matches("search", &row()));
    }

    #[test]
    fn test_filter_set_is_conjunctive() {
        let mut set = FilterSet::new();
        set.set("status", FilterValue::equals("selected"));
        set.set("search", FilterValue::search("kumar"));
        assert!(set.matches(&row()));

        set.set("subject", FilterValue::equals("Chemistry"));
        assert!(!set.matches(&row()));

        set.remove("subject");
        assert!(set.matches(&row()));
    }

    #[test]
    fn test_filter_set_ignores_defaults_when_empty() {
        let mut set = FilterSet::new();
        set.set("status", FilterValue::equals("all"));
        assert!(set.is_empty());
    }
}
