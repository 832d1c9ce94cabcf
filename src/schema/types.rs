//! Model and field definitions
//!
//! Supported field types:
//! - string: short text
//! - text: long text
//! - number: 64-bit floating point
//! - boolean
//! - date: calendar date, no time
//! - datetime: instant with time-of-day
//! - email: string with address format check
//! - url: string holding an absolute URL
//! - json: arbitrary nested value
//! - relation: declarative reference to another model

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use super::validator::{validate_field, ValidationResult};
use super::value::FieldValue;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern is valid")
});

/// Returns true if `name` is usable as a model or field name
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Closed set of field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Number,
    Boolean,
    Date,
    Datetime,
    Email,
    Url,
    Json,
    Relation,
}

impl FieldType {
    /// Every field type, in declaration order
    pub const ALL: [FieldType; 10] = [
        FieldType::String,
        FieldType::Text,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Email,
        FieldType::Url,
        FieldType::Json,
        FieldType::Relation,
    ];

    /// Returns the type name used in documents and messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Json => "json",
            FieldType::Relation => "relation",
        }
    }

    /// Types whose values are plain strings (pattern and options apply)
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Text | FieldType::Email | FieldType::Url
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Relation cardinality, declarative only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    ManyToMany,
}

impl RelationKind {
    /// Whether a value of this relation holds several ids
    pub fn is_many(&self) -> bool {
        matches!(self, RelationKind::HasMany | RelationKind::ManyToMany)
    }
}

/// One attribute of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Identifier-safe name, unique within the model
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display label, used in validation messages
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    /// Enumerated allowed values for string-like fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression that string-like values must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_kind: Option<RelationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

impl FieldDefinition {
    /// Create an optional field with no constraints
    pub fn new(name: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: label.into(),
            required: false,
            unique: false,
            default_value: None,
            options: None,
            min: None,
            max: None,
            pattern: None,
            help_text: None,
            relation_kind: None,
            related_model_id: None,
            foreign_key: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    /// Attach relation metadata. Not resolved by the store.
    pub fn with_relation(
        mut self,
        kind: RelationKind,
        related_model_id: impl Into<String>,
        foreign_key: Option<String>,
    ) -> Self {
        self.relation_kind = Some(kind);
        self.related_model_id = Some(related_model_id.into());
        self.foreign_key = foreign_key;
        self
    }

    /// Validates the field definition itself (not a value)
    pub fn validate_structure(&self) -> Result<(), String> {
        if !is_identifier(&self.name) {
            return Err(format!(
                "Field name '{}' must match [a-z][a-z0-9_]*",
                self.name
            ));
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(format!(
                    "Field '{}' has min {} greater than max {}",
                    self.name, min, max
                ));
            }
        }

        if let Some(pattern) = &self.pattern {
            if let Err(e) = Regex::new(pattern) {
                return Err(format!("Field '{}' has an invalid pattern: {}", self.name, e));
            }
        }

        if let Some(default) = &self.default_value {
            if let ValidationResult::Invalid(reason) = validate_field(self, Some(default)) {
                return Err(format!(
                    "Field '{}' has an invalid default value: {}",
                    self.name, reason
                ));
            }
        }

        Ok(())
    }
}

/// Partial update for a single field; only `Some` entries are applied
///
/// Clearable attributes use `Option<Option<_>>`: `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    pub required: Option<bool>,
    pub unique: Option<bool>,
    pub default_value: Option<Option<FieldValue>>,
    pub options: Option<Option<Vec<String>>>,
    pub min: Option<Option<f64>>,
    pub max: Option<Option<f64>>,
    pub pattern: Option<Option<String>>,
    pub help_text: Option<Option<String>>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn default_value(mut self, value: Option<FieldValue>) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn options(mut self, options: Option<Vec<String>>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn min(mut self, min: Option<f64>) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: Option<f64>) -> Self {
        self.max = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Option<String>) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn help_text(mut self, help_text: Option<String>) -> Self {
        self.help_text = Some(help_text);
        self
    }

    /// Returns a copy of `field` with this patch applied
    pub fn apply(&self, field: &FieldDefinition) -> FieldDefinition {
        let mut out = field.clone();
        if let Some(name) = &self.name {
            out.name = name.clone();
        }
        if let Some(field_type) = self.field_type {
            out.field_type = field_type;
        }
        if let Some(label) = &self.label {
            out.label = label.clone();
        }
        if let Some(required) = self.required {
            out.required = required;
        }
        if let Some(unique) = self.unique {
            out.unique = unique;
        }
        if let Some(default_value) = &self.default_value {
            out.default_value = default_value.clone();
        }
        if let Some(options) = &self.options {
            out.options = options.clone();
        }
        if let Some(min) = self.min {
            out.min = min;
        }
        if let Some(max) = self.max {
            out.max = max;
        }
        if let Some(pattern) = &self.pattern {
            out.pattern = pattern.clone();
        }
        if let Some(help_text) = &self.help_text {
            out.help_text = help_text.clone();
        }
        out
    }
}

/// Input to `SchemaRegistry::define_model`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub label: String,
    pub plural_label: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub display_field: Option<String>,
    pub order_by: Option<String>,
}

impl ModelSpec {
    /// New model spec with no fields. The plural label defaults to `label` + "s".
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            name: name.into(),
            plural_label: format!("{}s", label),
            label,
            description: None,
            icon: None,
            fields: Vec::new(),
            display_field: None,
            order_by: None,
        }
    }

    pub fn plural_label(mut self, plural_label: impl Into<String>) -> Self {
        self.plural_label = plural_label.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn display_field(mut self, name: impl Into<String>) -> Self {
        self.display_field = Some(name.into());
        self
    }

    pub fn order_by(mut self, name: impl Into<String>) -> Self {
        self.order_by = Some(name.into());
        self
    }
}

/// A stored model schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    /// Assigned at creation, never changes
    pub id: String,
    /// Internal identifier, unique across all models
    pub name: String,
    pub label: String,
    pub plural_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    /// Default sort field for queries that name none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModelDefinition {
    pub(crate) fn from_spec(id: String, spec: ModelSpec, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: spec.name,
            label: spec.label,
            plural_label: spec.plural_label,
            description: spec.description,
            icon: spec.icon,
            fields: spec.fields,
            display_field: spec.display_field,
            order_by: spec.order_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Validates the model structure and every field definition
    pub fn validate_structure(&self) -> Result<(), String> {
        if !is_identifier(&self.name) {
            return Err(format!(
                "Model name '{}' must match [a-z][a-z0-9_]*",
                self.name
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(format!("Duplicate field name '{}'", field.name));
            }
            field.validate_structure()?;
        }

        for (attr, value) in [
            ("displayField", &self.display_field),
            ("orderBy", &self.order_by),
        ] {
            if let Some(name) = value {
                if !self.has_field(name) {
                    return Err(format!("{} '{}' is not a field of the model", attr, name));
                }
            }
        }

        Ok(())
    }
}

/// Partial update for a model; `id` and `createdAt` are never patchable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelPatch {
    pub name: Option<String>,
    pub label: Option<String>,
    pub plural_label: Option<String>,
    pub description: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    /// Replaces the whole field list
    pub fields: Option<Vec<FieldDefinition>>,
    pub display_field: Option<Option<String>>,
    pub order_by: Option<Option<String>>,
}

impl ModelPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn plural_label(mut self, plural_label: impl Into<String>) -> Self {
        self.plural_label = Some(plural_label.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn display_field(mut self, name: Option<String>) -> Self {
        self.display_field = Some(name);
        self
    }

    pub fn order_by(mut self, name: Option<String>) -> Self {
        self.order_by = Some(name);
        self
    }

    /// Returns a copy of `model` with this patch applied; timestamps untouched
    pub fn apply(&self, model: &ModelDefinition) -> ModelDefinition {
        let mut out = model.clone();
        if let Some(name) = &self.name {
            out.name = name.clone();
        }
        if let Some(label) = &self.label {
            out.label = label.clone();
        }
        if let Some(plural_label) = &self.plural_label {
            out.plural_label = plural_label.clone();
        }
        if let Some(description) = &self.description {
            out.description = description.clone();
        }
        if let Some(icon) = &self.icon {
            out.icon = icon.clone();
        }
        if let Some(fields) = &self.fields {
            out.fields = fields.clone();
        }
        if let Some(display_field) = &self.display_field {
            out.display_field = display_field.clone();
        }
        if let Some(order_by) = &self.order_by {
            out.order_by = order_by.clone();
        }
        out
    }
}
