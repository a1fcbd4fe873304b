//! Remote directory snapshots.

use std::cmp::Ordering;

use serde_json::Value;

use super::SourceError;
use crate::models::Severity;

/// Complete point-in-time listing of remote records, in listing order.
///
/// Listing order follows the realtime database: integer-like ids first in
/// numeric order, then every other id in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<(String, Value)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from the JSON the remote source delivers.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Build a snapshot from a decoded value.
    ///
    /// `null` is an empty directory. Arrays are accepted because the remote
    /// database returns sequential numeric keys as an array; the index becomes
    /// the id and `null` holes are skipped.
    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        let mut records: Vec<(String, Value)> = match value {
            Value::Null => Vec::new(),
            Value::Object(map) => map.into_iter().collect(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .filter(|(_, fields)| !fields.is_null())
                .map(|(index, fields)| (index.to_string(), fields))
                .collect(),
            other => {
                return Err(SourceError::Malformed(format!(
                    "expected an object of records, got {}",
                    other
                )))
            }
        };
        records.sort_by(|(a, _), (b, _)| listing_order(a, b));
        Ok(Self { records })
    }

    /// Add or replace one record's fields.
    pub fn with_record(mut self, id: impl Into<String>, fields: Value) -> Self {
        let id = id.into();
        match self
            .records
            .binary_search_by(|(existing, _)| listing_order(existing, &id))
        {
            Ok(index) => self.records[index].1 = fields,
            Err(index) => self.records.insert(index, (id, fields)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Each id with its parsed severity, in listing order.
    pub fn severities(&self) -> impl Iterator<Item = (&str, Severity)> {
        self.records
            .iter()
            .map(|(id, fields)| (id.as_str(), Severity::from_field(fields.get("severity"))))
    }
}

/// Integer value of an id written in canonical decimal form.
fn integer_key(id: &str) -> Option<u64> {
    let value: u64 = id.parse().ok()?;
    (value.to_string() == id).then_some(value)
}

fn listing_order(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(snapshot: &Snapshot) -> Vec<String> {
        snapshot.severities().map(|(id, _)| id.to_string()).collect()
    }

    #[test]
    fn test_null_is_empty() {
        let snapshot = Snapshot::from_json("null").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_object_snapshot() {
        let snapshot =
            Snapshot::from_json(r#"{"B": {"severity": "Severe"}, "A": {"severity": "Mild"}}"#)
                .unwrap();

        assert_eq!(snapshot.len(), 2);
        let severities: Vec<_> = snapshot.severities().collect();
        assert_eq!(severities[0], ("A", Severity::Mild));
        assert_eq!(severities[1], ("B", Severity::Severe));
    }

    #[test]
    fn test_array_snapshot_skips_holes() {
        let snapshot =
            Snapshot::from_json(r#"[null, {"severity": "Mild"}, {"severity": 4}]"#).unwrap();

        assert_eq!(ids(&snapshot), vec!["1", "2"]);
    }

    #[test]
    fn test_array_keeps_index_order_past_ten() {
        let records: Vec<_> = (0..12).map(|_| json!({"severity": "Mild"})).collect();
        let snapshot = Snapshot::from_value(Value::Array(records)).unwrap();

        let expected: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        assert_eq!(ids(&snapshot), expected);
    }

    #[test]
    fn test_integer_ids_list_numerically_before_names() {
        let snapshot = Snapshot::from_json(
            r#"{"10": {}, "b": {}, "2": {}, "007": {}, "1": {}, "a": {}, "11": {}}"#,
        )
        .unwrap();
        assert_eq!(ids(&snapshot), vec!["1", "2", "10", "11", "007", "a", "b"]);

        let snapshot = snapshot
            .with_record("3", json!({}))
            .with_record("10", json!({"severity": "Mild"}));
        assert_eq!(ids(&snapshot), vec!["1", "2", "3", "10", "11", "007", "a", "b"]);
        assert_eq!(snapshot.len(), 8);
    }

    #[test]
    fn test_missing_severity_is_unknown() {
        let snapshot = Snapshot::new().with_record("7", json!({"age": 30}));
        let (_, severity) = snapshot.severities().next().unwrap();
        assert_eq!(severity, Severity::Unknown);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            Snapshot::from_json("42"),
            Err(SourceError::Malformed(_))
        ));
        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(SourceError::Malformed(_))
        ));
    }
}
