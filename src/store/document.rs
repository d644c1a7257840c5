//! Typed document values as they travel to and from the Content Store.
//!
//! The hosted store is schemaless: a document is a map of field names to
//! tagged values. [`FieldValue`] mirrors the store's value tags exactly, so a
//! [`Document`] serializes straight into the `fields` object of a REST
//! request:
//!
//! ```json
//! {
//!   "name":    { "stringValue": "Suya Platter" },
//!   "order":   { "integerValue": "3" },
//!   "popular": { "booleanValue": true },
//!   "createdAt": { "timestampValue": "2024-05-01T18:30:00Z" }
//! }
//! ```
//!
//! The getters on [`Fields`] are where a raw document is checked against the
//! shape a record expects. A missing required field or a value of the wrong
//! type is a [`DocumentError`], never a panic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}` should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// A single tagged value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    #[serde(rename = "stringValue")]
    String(String),
    /// The wire format carries 64-bit integers as decimal strings.
    #[serde(rename = "integerValue", with = "integer_string")]
    Integer(i64),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    #[serde(rename = "nullValue")]
    Null(()),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

mod integer_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Accepts both the canonical string form and a bare JSON number.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(i64),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(de::Error::custom),
            Repr::Number(n) => Ok(n),
        }
    }
}

/// Field map of one document.
pub type Document = BTreeMap<String, FieldValue>;

/// Read access to a [`Document`] with shape checking.
pub trait Fields {
    fn required_str(&self, field: &'static str) -> Result<String, DocumentError>;
    fn optional_str(&self, field: &'static str) -> Result<Option<String>, DocumentError>;
    fn optional_bool(&self, field: &'static str) -> Result<Option<bool>, DocumentError>;
    fn optional_i64(&self, field: &'static str) -> Result<Option<i64>, DocumentError>;
    fn optional_timestamp(
        &self,
        field: &'static str,
    ) -> Result<Option<DateTime<Utc>>, DocumentError>;
    /// A decimal that may have been written either as text or as a number.
    fn required_decimal_text(&self, field: &'static str) -> Result<String, DocumentError>;
}

impl Fields for Document {
    fn required_str(&self, field: &'static str) -> Result<String, DocumentError> {
        self.optional_str(field)?.ok_or(DocumentError::Missing(field))
    }

    fn optional_str(&self, field: &'static str) -> Result<Option<String>, DocumentError> {
        match self.get(field) {
            None | Some(FieldValue::Null(())) => Ok(None),
            Some(FieldValue::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(DocumentError::WrongType {
                field,
                expected: "a string",
            }),
        }
    }

    fn optional_bool(&self, field: &'static str) -> Result<Option<bool>, DocumentError> {
        match self.get(field) {
            None | Some(FieldValue::Null(())) => Ok(None),
            Some(FieldValue::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Err(DocumentError::WrongType {
                field,
                expected: "a boolean",
            }),
        }
    }

    fn optional_i64(&self, field: &'static str) -> Result<Option<i64>, DocumentError> {
        match self.get(field) {
            None | Some(FieldValue::Null(())) => Ok(None),
            Some(FieldValue::Integer(n)) => Ok(Some(*n)),
            Some(FieldValue::Double(d)) if d.fract() == 0.0 && d.is_finite() => Ok(Some(*d as i64)),
            Some(_) => Err(DocumentError::WrongType {
                field,
                expected: "an integer",
            }),
        }
    }

    fn optional_timestamp(
        &self,
        field: &'static str,
    ) -> Result<Option<DateTime<Utc>>, DocumentError> {
        match self.get(field) {
            None | Some(FieldValue::Null(())) => Ok(None),
            Some(FieldValue::Timestamp(ts)) => Ok(Some(*ts)),
            Some(_) => Err(DocumentError::WrongType {
                field,
                expected: "a timestamp",
            }),
        }
    }

    fn required_decimal_text(&self, field: &'static str) -> Result<String, DocumentError> {
        match self.get(field) {
            None | Some(FieldValue::Null(())) => Err(DocumentError::Missing(field)),
            Some(FieldValue::String(s)) => Ok(s.clone()),
            Some(FieldValue::Integer(n)) => Ok(n.to_string()),
            Some(FieldValue::Double(d)) => Ok(d.to_string()),
            Some(_) => Err(DocumentError::WrongType {
                field,
                expected: "a decimal",
            }),
        }
    }
}
