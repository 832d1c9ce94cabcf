//! Tagged record values
//!
//! Every value stored in a record carries the tag of the field type it was
//! conformed to. Values that arrive untyped (JSON input, persisted snapshots,
//! undeclared keys) start out loosely tagged and are converted explicitly with
//! [`FieldValue::conform`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::types::FieldType;

/// Mapping from field name to value for one record
pub type RecordData = BTreeMap<String, FieldValue>;

/// Reference(s) held by a relation field
#[derive(Debug, Clone, PartialEq)]
pub enum RelationRef {
    One(String),
    Many(Vec<String>),
}

/// A datetime value: the parsed instant plus the text it was read from.
///
/// Zone-less input is read as UTC. The text is what gets written back, so
/// offsets and precision survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    instant: DateTime<FixedOffset>,
    text: String,
}

impl Timestamp {
    /// RFC 3339, or `YYYY-MM-DDTHH:MM[:SS[.f]]` without a zone
    pub fn parse(s: &str) -> Option<Self> {
        let instant = DateTime::parse_from_rfc3339(s).ok().or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc().fixed_offset())
        })?;
        Some(Self {
            instant,
            text: s.to_string(),
        })
    }

    /// The instant in UTC, for ordering
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant.with_timezone(&Utc)
    }

    /// The instant with the offset it was given in
    pub fn local(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            instant: dt.fixed_offset(),
            text: dt.to_rfc3339(),
        }
    }
}

/// A single record value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Text(String),
    /// Kept as the JSON number it was read as, so integers stay exact
    Number(Number),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(Timestamp),
    Email(String),
    Url(String),
    Json(Value),
    Relation(RelationRef),
    /// Untyped value: undeclared keys, or structured input not yet conformed
    Raw(Value),
}

impl FieldValue {
    /// Converts untyped JSON into a loosely tagged value
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::String(s) => FieldValue::String(s),
            other => FieldValue::Raw(other),
        }
    }

    /// Number value from a float; non-finite floats have no JSON form
    pub fn number(n: f64) -> Self {
        Number::from_f64(n)
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Null)
    }

    /// Converts to the JSON document representation
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::String(s)
            | FieldValue::Text(s)
            | FieldValue::Email(s)
            | FieldValue::Url(s) => Value::String(s.clone()),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(ts) => Value::String(ts.text.clone()),
            FieldValue::Json(v) | FieldValue::Raw(v) => v.clone(),
            FieldValue::Relation(RelationRef::One(id)) => Value::String(id.clone()),
            FieldValue::Relation(RelationRef::Many(ids)) => {
                Value::Array(ids.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// String content of string-like values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s)
            | FieldValue::Text(s)
            | FieldValue::Email(s)
            | FieldValue::Url(s) => Some(s),
            FieldValue::Relation(RelationRef::One(id)) => Some(id),
            FieldValue::Raw(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) | FieldValue::Raw(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            FieldValue::Raw(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Raw(Value::Null))
    }

    /// Null or the empty string: treated as "no value" by validation
    pub fn is_blank(&self) -> bool {
        self.is_null() || self.as_str() == Some("")
    }

    /// Converts this value to the tag of `field_type`.
    ///
    /// Null passes through unchanged. On mismatch the error is the
    /// validation message for that type.
    pub fn conform(&self, field_type: FieldType) -> Result<FieldValue, String> {
        if self.is_null() {
            return Ok(FieldValue::Null);
        }

        match field_type {
            FieldType::String => self.conform_text(FieldValue::String),
            FieldType::Text => self.conform_text(FieldValue::Text),
            FieldType::Email => self.conform_text(FieldValue::Email),
            FieldType::Url => self.conform_text(FieldValue::Url),
            FieldType::Number => match self {
                FieldValue::Number(n) | FieldValue::Raw(Value::Number(n)) => {
                    Ok(FieldValue::Number(n.clone()))
                }
                _ => Err("Value must be a number".into()),
            },
            FieldType::Boolean => self
                .as_bool()
                .map(FieldValue::Boolean)
                .ok_or_else(|| "Value must be true or false".into()),
            FieldType::Date => match self {
                FieldValue::Date(d) => Ok(FieldValue::Date(*d)),
                other => other
                    .as_str()
                    .and_then(parse_date)
                    .map(FieldValue::Date)
                    .ok_or_else(|| "Invalid date format".into()),
            },
            FieldType::Datetime => match self {
                FieldValue::DateTime(ts) => Ok(FieldValue::DateTime(ts.clone())),
                other => other
                    .as_str()
                    .and_then(Timestamp::parse)
                    .map(FieldValue::DateTime)
                    .ok_or_else(|| "Invalid datetime format".into()),
            },
            FieldType::Json => match self {
                FieldValue::Json(v) => Ok(FieldValue::Json(v.clone())),
                other => Ok(FieldValue::Json(other.to_json())),
            },
            FieldType::Relation => self.conform_relation(),
        }
    }

    fn conform_text(&self, tag: fn(String) -> FieldValue) -> Result<FieldValue, String> {
        match self {
            FieldValue::Relation(_) => Err("Value must be text".into()),
            other => other
                .as_str()
                .map(|s| tag(s.to_string()))
                .ok_or_else(|| "Value must be text".into()),
        }
    }

    fn conform_relation(&self) -> Result<FieldValue, String> {
        let invalid = || "Invalid relation reference".to_string();
        match self {
            FieldValue::Relation(r) => Ok(FieldValue::Relation(r.clone())),
            FieldValue::Raw(Value::Array(items)) | FieldValue::Json(Value::Array(items)) => {
                let ids = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(invalid)?;
                Ok(FieldValue::Relation(RelationRef::Many(ids)))
            }
            other => other
                .as_str()
                .map(|s| FieldValue::Relation(RelationRef::One(s.to_string())))
                .ok_or_else(invalid),
        }
    }
}

/// Zero-padded `YYYY-MM-DD` only, so the stored date prints back as given
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .filter(|d| d.format("%Y-%m-%d").to_string() == s)
}

/// Converts a JSON object into record data; anything else yields no entries
pub fn data_from_json(value: Value) -> RecordData {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from_json(v)))
            .collect(),
        _ => RecordData::new(),
    }
}

/// Converts record data into a JSON object
pub fn data_to_json(data: &RecordData) -> Value {
    Value::Object(
        data.iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FieldValue::from_json)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() => write!(f, "{}", x),
                _ => write!(f, "{}", n),
            },
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(ts) => f.write_str(&ts.text),
            other => match other.as_str() {
                Some(s) => f.write_str(s),
                None => write!(f, "{}", other.to_json()),
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n.into())
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(i64::from(n).into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldValue::DateTime(dt.into())
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::from_json(v)
    }
}
