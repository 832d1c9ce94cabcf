//! Record, stats and stale-record report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{FieldValue, ModelDefinition, RecordData};

/// One data instance of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: String,
    pub model_id: String,
    /// Declared and undeclared keys alike; undeclared keys are kept verbatim
    pub data: RecordData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModelRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.data.get(field)
    }

    /// Human-readable label using the model's display field, falling back to the id
    pub fn display_value(&self, model: &ModelDefinition) -> String {
        model
            .display_field
            .as_deref()
            .and_then(|name| self.data.get(name))
            .filter(|v| !v.is_blank())
            .map(|v| v.to_string())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Per-model statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub total_records: usize,
    /// Latest `updatedAt` across the model's records
    pub last_updated: Option<DateTime<Utc>>,
}

/// A stored record that no longer satisfies its model's current fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleRecord {
    pub record_id: String,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{data_from_json, FieldDefinition, FieldType};
    use serde_json::json;

    fn record(data: serde_json::Value) -> ModelRecord {
        let now = Utc::now();
        ModelRecord {
            id: "record_1".into(),
            model_id: "model_1".into(),
            data: data_from_json(data),
            created_at: now,
            updated_at: now,
        }
    }

    fn model() -> ModelDefinition {
        serde_json::from_value(json!({
            "id": "model_1",
            "name": "blog_post",
            "label": "Blog Post",
            "pluralLabel": "Blog Posts",
            "fields": [{"name": "title", "type": "string", "label": "Title"}],
            "displayField": "title",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_display_value() {
        let model = model();
        assert_eq!(record(json!({"title": "Welcome"})).display_value(&model), "Welcome");
        assert_eq!(record(json!({"title": ""})).display_value(&model), "record_1");

        let mut untitled = model.clone();
        untitled.display_field = None;
        untitled.fields = vec![FieldDefinition::new("title", FieldType::String, "Title")];
        assert_eq!(record(json!({"title": "Welcome"})).display_value(&untitled), "record_1");
    }

    #[test]
    fn test_serialized_shape() {
        let doc = serde_json::to_value(record(json!({"price": 10}))).unwrap();
        assert_eq!(doc["modelId"], "model_1");
        assert_eq!(doc["data"]["price"], json!(10.0));
        assert!(doc["createdAt"].is_string());
    }
}
