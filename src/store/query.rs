//! Query options and results
//!
//! Evaluation order: filter, then sort, then offset, then limit.
//! `total` is the model's record count before any of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::ModelRecord;
use crate::schema::FieldValue;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Options for `RecordStore::query`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
    /// Field name to expected value; all entries must match
    pub filter: BTreeMap<String, FieldValue>,
    /// Sort field; falls back to the model's `orderBy`
    pub order_by: Option<String>,
    pub order: SortOrder,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, expected: impl Into<FieldValue>) -> Self {
        self.filter.insert(field.into(), expected.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn asc(mut self) -> Self {
        self.order = SortOrder::Asc;
        self
    }

    pub fn desc(mut self) -> Self {
        self.order = SortOrder::Desc;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub records: Vec<ModelRecord>,
    /// Record count of the model, before filtering and pagination
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let options = QueryOptions::new()
            .filter("name", "wid")
            .order_by("price")
            .desc()
            .offset(5)
            .limit(10);

        assert_eq!(options.filter["name"], FieldValue::from("wid"));
        assert_eq!(options.order, SortOrder::Desc);
        assert_eq!(options.offset, Some(5));
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_from_json_document() {
        let options: QueryOptions = serde_json::from_value(json!({
            "filter": {"in_stock": true},
            "orderBy": "name",
            "limit": 20
        }))
        .unwrap();

        assert_eq!(options.filter["in_stock"], FieldValue::Boolean(true));
        assert_eq!(options.order, SortOrder::Asc);
        assert_eq!(options.offset, None);
        assert_eq!(options.limit, Some(20));
    }
}
