// ABOUTME: The Row document type: an insertion-ordered mapping of field names to JSON values.
// ABOUTME: Implements the shallow merge used by updates and the equality test used by filters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row's fields. Equality is structural: two rows with the same
/// fields compare equal regardless of field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

/// Returned when converting a non-object JSON value into a Row.
#[derive(Debug, Clone, PartialEq)]
pub struct NotAnObject(pub Value);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field, returning its previous value. An existing field keeps
    /// its position; a new field is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Overlay `partial` on top of this row. Top-level keys in `partial`
    /// replace (or extend) this row's keys; nested values are replaced
    /// wholesale. Keys absent from `partial` are left untouched.
    pub fn merge(&mut self, partial: Row) {
        for (key, value) in partial.0 {
            self.0.insert(key, value);
        }
    }

    /// True if the row has `key` and its value is exactly `value`.
    pub fn matches(&self, key: &str, value: &Value) -> bool {
        self.0.get(key) == Some(value)
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        Value::Object(row.0)
    }
}

impl TryFrom<Value> for Row {
    type Error = NotAnObject;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(NotAnObject(other)),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        Row::try_from(value).unwrap()
    }

    #[test]
    fn merge_overwrites_matching_keys_and_keeps_others() {
        let mut existing = row(json!({"title": "A", "author": "X", "date": "D1"}));
        existing.merge(row(json!({"date": "D2"})));

        assert_eq!(existing, row(json!({"title": "A", "author": "X", "date": "D2"})));
    }

    #[test]
    fn merge_appends_new_keys_in_order() {
        let mut existing = row(json!({"title": "A", "date": "D1"}));
        existing.merge(row(json!({"coauthor": "Y", "date": "D2", "tags": ["t"]})));

        let keys: Vec<&str> = existing.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "date", "coauthor", "tags"]);
        assert_eq!(existing.get("date"), Some(&json!("D2")));
    }

    #[test]
    fn merge_replaces_nested_values_wholesale() {
        let mut existing = row(json!({"meta": {"a": 1, "b": 2}}));
        existing.merge(row(json!({"meta": {"c": 3}})));

        assert_eq!(existing.get("meta"), Some(&json!({"c": 3})));
    }

    #[test]
    fn merge_with_empty_partial_is_identity() {
        let original = row(json!({"x": 1, "y": null}));
        let mut merged = original.clone();
        merged.merge(Row::new());
        assert_eq!(merged, original);
    }

    #[test]
    fn equality_ignores_field_order() {
        assert_eq!(row(json!({"a": 1, "b": 2})), row(json!({"b": 2, "a": 1})));
    }

    #[test]
    fn matches_requires_key_and_strict_equality() {
        let r = row(json!({"group": "2", "count": 2, "flag": null}));

        assert!(r.matches("group", &json!("2")));
        assert!(!r.matches("group", &json!(2)));
        assert!(!r.matches("count", &json!("2")));
        assert!(r.matches("flag", &Value::Null));
        assert!(!r.matches("missing", &Value::Null));
    }

    #[test]
    fn try_from_rejects_non_objects() {
        let err = Row::try_from(json!([1, 2])).unwrap_err();
        assert_eq!(err, NotAnObject(json!([1, 2])));
    }

    #[test]
    fn remove_preserves_order_of_remaining_keys() {
        let mut r = row(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(r.remove("b"), Some(json!(2)));
        let keys: Vec<&str> = r.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
