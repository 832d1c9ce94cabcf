//! Record filtering for queries
//!
//! - String expected values: case-insensitive substring of a string value,
//!   or of the stored text of a date or datetime
//! - Everything else: exact equality, no coercion
//! - Missing field = no match
//! - All entries must match (AND semantics)

use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::record::ModelRecord;
use crate::schema::FieldValue;

/// Evaluates filter maps against records
pub struct RecordFilter;

impl RecordFilter {
    /// Checks if a record matches every filter entry
    pub fn matches(record: &ModelRecord, filter: &BTreeMap<String, FieldValue>) -> bool {
        filter
            .iter()
            .all(|(field, expected)| match record.get(field) {
                Some(actual) => Self::matches_value(actual, expected),
                None => false,
            })
    }

    fn matches_value(actual: &FieldValue, expected: &FieldValue) -> bool {
        match (Self::expected_text(expected), Self::actual_text(actual)) {
            (Some(needle), Some(haystack)) => haystack
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => values_equal(actual, expected),
        }
    }

    /// Text a string filter is matched against
    fn actual_text(actual: &FieldValue) -> Option<Cow<'_, str>> {
        match actual {
            FieldValue::Date(_) | FieldValue::DateTime(_) => Some(Cow::Owned(actual.to_string())),
            other => other.as_str().map(Cow::Borrowed),
        }
    }

    /// Text of string-typed expected values
    fn expected_text(expected: &FieldValue) -> Option<&str> {
        match expected {
            FieldValue::String(s)
            | FieldValue::Text(s)
            | FieldValue::Email(s)
            | FieldValue::Url(s)
            | FieldValue::Raw(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// Exact equality across tags by document representation. Integers compare
/// exactly; a float compares with any number by value.
pub fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    match (a.to_json(), b.to_json()) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        (x, y) => x == y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{data_from_json, FieldType};
    use chrono::Utc;
    use serde_json::json;

    fn record(data: Value) -> ModelRecord {
        let now = Utc::now();
        ModelRecord {
            id: "r".into(),
            model_id: "m".into(),
            data: data_from_json(data),
            created_at: now,
            updated_at: now,
        }
    }

    fn filter(entries: Value) -> BTreeMap<String, FieldValue> {
        data_from_json(entries)
    }

    #[test]
    fn test_substring_case_insensitive() {
        let widget = record(json!({"name": "Widget"}));
        let gadget = record(json!({"name": "Gadget"}));

        let f = filter(json!({"name": "wid"}));
        assert!(RecordFilter::matches(&widget, &f));
        assert!(!RecordFilter::matches(&gadget, &f));
    }

    #[test]
    fn test_no_type_coercion() {
        let doc = record(json!({"value": 123}));

        assert!(!RecordFilter::matches(&doc, &filter(json!({"value": "123"}))));
        assert!(RecordFilter::matches(&doc, &filter(json!({"value": 123}))));
    }

    #[test]
    fn test_exact_match_for_non_strings() {
        let doc = record(json!({"in_stock": true, "price": 10}));

        assert!(RecordFilter::matches(&doc, &filter(json!({"in_stock": true}))));
        assert!(!RecordFilter::matches(&doc, &filter(json!({"in_stock": false}))));
        assert!(!RecordFilter::matches(&doc, &filter(json!({"price": 1}))));
    }

    #[test]
    fn test_multiple_entries_and() {
        let doc = record(json!({"name": "Widget", "in_stock": true}));

        assert!(RecordFilter::matches(
            &doc,
            &filter(json!({"name": "WIDG", "in_stock": true}))
        ));
        assert!(!RecordFilter::matches(
            &doc,
            &filter(json!({"name": "WIDG", "in_stock": false}))
        ));
    }

    #[test]
    fn test_missing_field_no_match() {
        let doc = record(json!({"name": "Alice"}));
        assert!(!RecordFilter::matches(&doc, &filter(json!({"age": 30}))));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let doc = record(json!({}));
        assert!(RecordFilter::matches(&doc, &BTreeMap::new()));
    }

    #[test]
    fn test_string_filter_on_dates_uses_stored_text() {
        let mut doc = record(json!({}));
        doc.data.insert(
            "day".into(),
            FieldValue::from("2024-01-15").conform(FieldType::Date).unwrap(),
        );
        doc.data.insert(
            "starts_at".into(),
            FieldValue::from("2024-10-17T10:00:00+02:00")
                .conform(FieldType::Datetime)
                .unwrap(),
        );

        assert!(RecordFilter::matches(&doc, &filter(json!({"day": "2024-01"}))));
        assert!(!RecordFilter::matches(&doc, &filter(json!({"day": "2024-02"}))));
        assert!(RecordFilter::matches(
            &doc,
            &filter(json!({"starts_at": "2024-10-17T10:00:00+02:00"}))
        ));
        assert!(RecordFilter::matches(&doc, &filter(json!({"starts_at": "+02:00"}))));
    }

    #[test]
    fn test_integers_compare_exactly() {
        let doc = record(json!({"legacy_id": 9007199254740993u64}));
        assert!(RecordFilter::matches(
            &doc,
            &filter(json!({"legacy_id": 9007199254740993u64}))
        ));
        assert!(!RecordFilter::matches(
            &doc,
            &filter(json!({"legacy_id": 9007199254740992u64}))
        ));

        let price = record(json!({"price": 10}));
        assert!(RecordFilter::matches(&price, &filter(json!({"price": 10.0}))));
    }

    #[test]
    fn test_typed_values_compare_with_loose_ones() {
        let doc = record(json!({"tags": ["a", "b"]}));
        let typed = BTreeMap::from([(
            "tags".to_string(),
            FieldValue::Json(json!(["a", "b"])),
        )]);
        assert!(RecordFilter::matches(&doc, &typed));
    }
}
