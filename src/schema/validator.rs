//! Field and record validation
//!
//! Rules for a single field, first failure wins:
//! 1. Required: absent, null or empty string fails with "<label> is required"
//! 2. Type checks, only when a value is present: the value must conform to
//!    the field type; email and url formats; number bounds
//! 3. Pattern, for string-like types
//! 4. Options, for string-like types
//!
//! Validation is pure. It never mutates the value it inspects, so the same
//! functions serve form-level checks and write-time checks.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};
use url::Url;

use super::types::{FieldDefinition, FieldType, ModelDefinition};
use super::value::{FieldValue, RecordData, RelationRef};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Field patterns compiled so far, keyed by source
static PATTERNS: LazyLock<RwLock<HashMap<String, Regex>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Outcome of validating one value against one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// The failure reason, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(reason) => Some(reason),
        }
    }
}

/// Validates a candidate value (`None` = absent) against a field definition
pub fn validate_field(field: &FieldDefinition, value: Option<&FieldValue>) -> ValidationResult {
    let Some(value) = value.filter(|v| !v.is_blank()) else {
        if field.required {
            return ValidationResult::Invalid(format!("{} is required", field.label));
        }
        return ValidationResult::Valid;
    };

    let conformed = match value.conform(field.field_type) {
        Ok(v) => v,
        Err(reason) => return ValidationResult::Invalid(reason),
    };

    if let Err(reason) = check_format(field, &conformed) {
        return ValidationResult::Invalid(reason);
    }

    if field.field_type.is_string_like() {
        if let Some(text) = conformed.as_str() {
            if let Err(reason) = check_pattern(field, text) {
                return ValidationResult::Invalid(reason);
            }
            if let Err(reason) = check_options(field, text) {
                return ValidationResult::Invalid(reason);
            }
        }
    }

    ValidationResult::Valid
}

fn check_format(field: &FieldDefinition, value: &FieldValue) -> Result<(), String> {
    match (field.field_type, value) {
        (FieldType::Email, FieldValue::Email(s)) => {
            if !EMAIL.is_match(s) {
                return Err("Invalid email format".into());
            }
        }
        (FieldType::Url, FieldValue::Url(s)) => {
            if !is_absolute_url(s) {
                return Err("Invalid URL format".into());
            }
        }
        (FieldType::Number, FieldValue::Number(n)) => {
            let n = n.as_f64().unwrap_or(f64::NAN);
            if let Some(min) = field.min {
                if n < min {
                    return Err(format!("Value must be at least {}", min));
                }
            }
            if let Some(max) = field.max {
                if n > max {
                    return Err(format!("Value must be at most {}", max));
                }
            }
        }
        (FieldType::Relation, FieldValue::Relation(RelationRef::Many(_))) => {
            if field.relation_kind.is_some_and(|kind| !kind.is_many()) {
                return Err("Invalid relation reference".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn check_pattern(field: &FieldDefinition, text: &str) -> Result<(), String> {
    let Some(pattern) = &field.pattern else {
        return Ok(());
    };
    match compiled(pattern) {
        Some(re) if re.is_match(text) => Ok(()),
        _ => Err("Value doesn't match required pattern".into()),
    }
}

/// Compiles each distinct pattern once; `None` if it does not compile
fn compiled(pattern: &str) -> Option<Regex> {
    let cached = PATTERNS
        .read()
        .ok()
        .and_then(|patterns| patterns.get(pattern).cloned());
    if cached.is_some() {
        return cached;
    }

    let re = Regex::new(pattern).ok()?;
    if let Ok(mut patterns) = PATTERNS.write() {
        patterns.insert(pattern.to_string(), re.clone());
    }
    Some(re)
}

fn check_options(field: &FieldDefinition, text: &str) -> Result<(), String> {
    match &field.options {
        Some(options) if !options.is_empty() && !options.iter().any(|o| o == text) => {
            Err(format!("Value must be one of: {}", options.join(", ")))
        }
        _ => Ok(()),
    }
}

fn is_absolute_url(s: &str) -> bool {
    Url::parse(s).map(|u| u.has_host()).unwrap_or(false)
}

/// Validates whole records against one model's fields.
///
/// Borrowed view over the model; does not touch the registry.
pub struct RecordValidator<'a> {
    model: &'a ModelDefinition,
}

impl<'a> RecordValidator<'a> {
    pub fn new(model: &'a ModelDefinition) -> Self {
        Self { model }
    }

    /// Returns one message per failing declared field, in field order.
    /// Undeclared keys are not checked.
    pub fn validate(&self, data: &RecordData) -> Vec<String> {
        self.model
            .fields
            .iter()
            .filter_map(|field| match validate_field(field, data.get(&field.name)) {
                ValidationResult::Valid => None,
                ValidationResult::Invalid(reason) => Some(reason),
            })
            .collect()
    }

    /// Fills absent declared fields from their default values
    pub fn apply_defaults(&self, data: &mut RecordData) {
        for field in &self.model.fields {
            if let Some(default) = &field.default_value {
                data.entry(field.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    /// Retags declared values to their field types. Values that do not
    /// conform (e.g. empty strings in optional date fields) are kept as is.
    pub fn conform(&self, data: RecordData) -> RecordData {
        data.into_iter()
            .map(|(name, value)| {
                let value = match self.model.field(&name) {
                    Some(field) if !value.is_blank() => {
                        value.conform(field.field_type).unwrap_or(value)
                    }
                    _ => value,
                };
                (name, value)
            })
            .collect()
    }
}
