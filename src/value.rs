//! Value types carried by record entries
//!
//! Every entry declares one of the [`SchemaType`] families; a [`Value`] is a
//! concrete datum belonging to exactly one family. Validated writes compare
//! the two (see `RecordBuilder`), nothing else in the core interprets values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Type family of a schema, entry, or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    /// Nested structure described by an element schema
    Record,
    /// Homogeneous sequence described by an element schema
    Array,
    String,
    Bytes,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Datetime,
}

impl SchemaType {
    /// Whether entries of this type must carry an element schema.
    pub fn requires_element_schema(self) -> bool {
        matches!(self, SchemaType::Record | SchemaType::Array)
    }
}

/// A single typed datum held by a record.
///
/// Equality is structural identity, not numeric equality: floating point
/// variants compare by bit pattern (`NaN == NaN`, `0.0 != -0.0`), which keeps
/// `Value`, `Entry`, and `Schema` usable as hash-map keys. Callers that need
/// numeric comparison should compare the extracted primitives instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    String(String),
    Bytes(Vec<u8>),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Datetime(DateTime<Utc>),
    Record(Record),
    Array(Vec<Value>),
}

impl Value {
    /// The type family this value belongs to.
    pub fn value_type(&self) -> SchemaType {
        match self {
            Value::String(_) => SchemaType::String,
            Value::Bytes(_) => SchemaType::Bytes,
            Value::Int(_) => SchemaType::Int,
            Value::Long(_) => SchemaType::Long,
            Value::Float(_) => SchemaType::Float,
            Value::Double(_) => SchemaType::Double,
            Value::Boolean(_) => SchemaType::Boolean,
            Value::Datetime(_) => SchemaType::Datetime,
            Value::Record(_) => SchemaType::Record,
            Value::Array(_) => SchemaType::Array,
        }
    }

    /// Whether this value may be written through an accessor of `schema_type`.
    pub fn matches(&self, schema_type: SchemaType) -> bool {
        self.value_type() == schema_type
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_families() {
        assert_eq!(Value::from("x").value_type(), SchemaType::String);
        assert_eq!(Value::Int(3).value_type(), SchemaType::Int);
        assert!(Value::Long(3).matches(SchemaType::Long));
        assert!(!Value::Long(3).matches(SchemaType::Int));
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
    }
}
