//! Record: immutable, schema-validated value container
//!
//! A record is bound to exactly one schema at build time and holds one typed
//! value per entry name. Writes go through [`RecordBuilder`] and are
//! validated against the bound schema; once built, a record never changes.
//! Later "modification" produces a new overlay instance (see
//! [`Record::put`] in the overlay module).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entry::EntryBuilder;
use crate::error::{Result, SchemaError};
use crate::sanitize::sanitize_name;
use crate::schema::{Schema, SchemaBuilder};
use crate::value::Value;

/// An immutable record: one validated value per entry of its schema.
///
/// Unset entries, nullable or not, read back as `None`; reading an unset
/// non-nullable entry is a caller error that this implementation answers
/// with `None` rather than a failure.
#[derive(Debug, Clone)]
pub struct Record {
    pub(crate) schema: Schema,
    /// Base value snapshot, shared by every overlay derived from it.
    pub(crate) values: Arc<BTreeMap<String, Value>>,
    /// Overlay delta: explicit `None` is an honored null override.
    pub(crate) delta: BTreeMap<String, Option<Value>>,
}

impl Record {
    pub(crate) fn from_parts(schema: Schema, values: BTreeMap<String, Value>) -> Self {
        Record {
            schema,
            values: Arc::new(values),
            delta: BTreeMap::new(),
        }
    }

    /// The schema this record was built against. Overlay writes never change
    /// it.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Raw value lookup: the overlay delta is consulted first (an explicit
    /// null override is honored and surfaces as `None`), then the base
    /// snapshot.
    pub fn value(&self, name: &str) -> Option<&Value> {
        if let Some(overridden) = self.delta.get(name) {
            return overridden.as_ref();
        }
        self.values.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        match self.value(name)? {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.value(name)? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        match self.value(name)? {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.value(name)? {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        match self.value(name)? {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.value(name)? {
            Value::Datetime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_record(&self, name: &str) -> Option<&Record> {
        match self.value(name)? {
            Value::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_array(&self, name: &str) -> Option<&[Value]> {
        match self.value(name)? {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Effective `name -> value` view with the overlay delta applied;
    /// explicit null overrides appear as `None`.
    fn effective_values(&self) -> BTreeMap<&str, Option<&Value>> {
        let mut merged: BTreeMap<&str, Option<&Value>> = self
            .values
            .iter()
            .map(|(name, value)| (name.as_str(), Some(value)))
            .collect();
        for (name, value) in &self.delta {
            merged.insert(name.as_str(), value.as_ref());
        }
        merged
    }
}

impl PartialEq for Record {
    /// Structural equality over the schema and the effective values. An
    /// explicit null override compares equal to an unset entry; both read
    /// back as `None`.
    fn eq(&self, other: &Self) -> bool {
        if self.schema != other.schema {
            return false;
        }
        let mine = self.effective_values();
        let theirs = other.effective_values();
        let names: std::collections::BTreeSet<&str> = mine
            .keys()
            .chain(theirs.keys())
            .copied()
            .collect();
        names.into_iter().all(|name| {
            mine.get(name).copied().flatten() == theirs.get(name).copied().flatten()
        })
    }
}

impl Eq for Record {}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Record", 2)?;
        state.serialize_field("schema", &self.schema)?;
        state.serialize_field("values", &self.effective_values())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawRecord {
            schema: Schema,
            #[serde(default)]
            values: BTreeMap<String, Option<Value>>,
        }

        let raw = RawRecord::deserialize(deserializer)?;
        let values = raw
            .values
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        Ok(Record::from_parts(raw.schema, values))
    }
}

/// Builder for [`Record`].
///
/// Schema-bound builders validate every write against the bound schema and
/// fail fast at the offending call. Dynamic builders
/// ([`RecordBuilder::dynamic`]) have no schema up front: the first write to a
/// field materializes a nullable entry inferred from the value, and `build`
/// derives the schema.
#[derive(Debug)]
pub struct RecordBuilder {
    mode: BuilderMode,
    values: BTreeMap<String, Value>,
}

#[derive(Debug)]
enum BuilderMode {
    Bound(Schema),
    Dynamic(SchemaBuilder),
}

impl RecordBuilder {
    /// Builder bound to `schema`; every write is validated against it.
    pub fn new(schema: Schema) -> Self {
        RecordBuilder {
            mode: BuilderMode::Bound(schema),
            values: BTreeMap::new(),
        }
    }

    /// Schema-less builder: entries are inferred from written values.
    pub fn dynamic() -> Self {
        RecordBuilder {
            mode: BuilderMode::Dynamic(SchemaBuilder::record()),
            values: BTreeMap::new(),
        }
    }

    pub fn with_string(self, name: &str, value: impl Into<String>) -> Result<Self> {
        self.with_value(name, Some(Value::String(value.into())))
    }

    pub fn with_bytes(self, name: &str, value: impl Into<Vec<u8>>) -> Result<Self> {
        self.with_value(name, Some(Value::Bytes(value.into())))
    }

    pub fn with_int(self, name: &str, value: i32) -> Result<Self> {
        self.with_value(name, Some(Value::Int(value)))
    }

    pub fn with_long(self, name: &str, value: i64) -> Result<Self> {
        self.with_value(name, Some(Value::Long(value)))
    }

    pub fn with_float(self, name: &str, value: f32) -> Result<Self> {
        self.with_value(name, Some(Value::Float(value)))
    }

    pub fn with_double(self, name: &str, value: f64) -> Result<Self> {
        self.with_value(name, Some(Value::Double(value)))
    }

    pub fn with_boolean(self, name: &str, value: bool) -> Result<Self> {
        self.with_value(name, Some(Value::Boolean(value)))
    }

    pub fn with_datetime(self, name: &str, value: DateTime<Utc>) -> Result<Self> {
        self.with_value(name, Some(Value::Datetime(value)))
    }

    pub fn with_record(self, name: &str, value: Record) -> Result<Self> {
        self.with_value(name, Some(Value::Record(value)))
    }

    pub fn with_array(self, name: &str, value: Vec<Value>) -> Result<Self> {
        self.with_value(name, Some(Value::Array(value)))
    }

    /// Write an explicit null. The entry must be nullable.
    pub fn with_null(self, name: &str) -> Result<Self> {
        self.with_value(name, None)
    }

    /// Generic validated write.
    ///
    /// Fails with an unknown-entry error when `name` is not in the bound
    /// schema, a nullability violation when `value` is `None` and the entry
    /// is not nullable, and a type mismatch when the value's family differs
    /// from the entry's declared family.
    pub fn with_value(mut self, name: &str, value: Option<Value>) -> Result<Self> {
        match &mut self.mode {
            BuilderMode::Bound(schema) => {
                let entry = schema
                    .get_entry(name)
                    .ok_or_else(|| SchemaError::UnknownEntry {
                        name: name.to_string(),
                    })?;
                match &value {
                    None if !entry.is_nullable() => {
                        return Err(SchemaError::NullabilityViolation {
                            name: name.to_string(),
                        })
                    }
                    Some(v) if !v.matches(entry.schema_type()) => {
                        return Err(SchemaError::TypeMismatch {
                            name: name.to_string(),
                            expected: entry.schema_type(),
                            actual: v.value_type(),
                        })
                    }
                    _ => {}
                }
                match value {
                    Some(v) => {
                        self.values.insert(name.to_string(), v);
                    }
                    None => {
                        self.values.remove(name);
                    }
                }
            }
            BuilderMode::Dynamic(builder) => {
                let sanitized = sanitize_name(name);
                let raw = if sanitized != name { Some(name) } else { None };
                if let Some(existing) = builder.find_identity(&sanitized, raw) {
                    let final_name = existing.name().to_string();
                    let expected = existing.schema_type();
                    match value {
                        Some(v) if !v.matches(expected) => {
                            return Err(SchemaError::TypeMismatch {
                                name: final_name,
                                expected,
                                actual: v.value_type(),
                            })
                        }
                        Some(v) => {
                            self.values.insert(final_name, v);
                        }
                        None => {
                            self.values.remove(&final_name);
                        }
                    }
                } else {
                    let Some(v) = value else {
                        return Err(SchemaError::config(format!(
                            "cannot infer the type of '{name}' from a null write"
                        )));
                    };
                    let entry = Self::infer_entry(name, &v)?;
                    let final_name = builder.insert_entry(entry)?;
                    self.values.insert(final_name, v);
                }
            }
        }
        Ok(self)
    }

    /// Snapshot the captured values into an immutable record.
    pub fn build(self) -> Record {
        let schema = match self.mode {
            BuilderMode::Bound(schema) => schema,
            BuilderMode::Dynamic(mut builder) => builder.build(),
        };
        Record::from_parts(schema, self.values)
    }

    /// Nullable entry inferred from the first value written to a dynamic
    /// field.
    fn infer_entry(name: &str, value: &Value) -> Result<crate::entry::Entry> {
        let mut builder = EntryBuilder::new()
            .with_name(name)
            .with_type(value.value_type())
            .with_nullable(true);
        match value {
            Value::Record(record) => {
                builder = builder.with_element_schema(record.schema().clone());
            }
            Value::Array(values) => {
                let Some(first) = values.first() else {
                    return Err(SchemaError::config(format!(
                        "cannot infer the element type of '{name}' from an empty array"
                    )));
                };
                let element = match first {
                    Value::Record(record) => record.schema().clone(),
                    other => SchemaBuilder::new(other.value_type()).build(),
                };
                builder = builder.with_element_schema(element);
            }
            _ => {}
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SchemaType;

    fn test_schema() -> Schema {
        SchemaBuilder::record()
            .with_entry(
                EntryBuilder::new()
                    .with_name("id")
                    .with_type(SchemaType::Int)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .with_entry(
                EntryBuilder::new()
                    .with_name("label")
                    .with_type(SchemaType::String)
                    .with_nullable(true)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .with_entry(
                EntryBuilder::new()
                    .with_name("source")
                    .with_type(SchemaType::String)
                    .with_metadata(true)
                    .with_nullable(true)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .build()
    }

    #[test]
    fn test_validated_writes() {
        let record = RecordBuilder::new(test_schema())
            .with_int("id", 34)
            .unwrap()
            .with_string("label", "hello")
            .unwrap()
            .with_string("source", "ingest")
            .unwrap()
            .build();
        assert_eq!(record.get_int("id"), Some(34));
        assert_eq!(record.get_string("label"), Some("hello"));
        assert_eq!(record.get_string("source"), Some("ingest"));
    }

    #[test]
    fn test_unknown_entry_rejected() {
        let result = RecordBuilder::new(test_schema()).with_int("ghost", 1);
        assert!(matches!(result, Err(SchemaError::UnknownEntry { .. })));
    }

    #[test]
    fn test_nullability_enforced() {
        let result = RecordBuilder::new(test_schema()).with_null("id");
        assert!(matches!(
            result,
            Err(SchemaError::NullabilityViolation { .. })
        ));
        let record = RecordBuilder::new(test_schema())
            .with_null("label")
            .unwrap()
            .build();
        assert_eq!(record.get_string("label"), None);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let result = RecordBuilder::new(test_schema()).with_string("id", "34");
        assert!(matches!(result, Err(SchemaError::TypeMismatch { .. })));
    }

    #[test]
    fn test_unset_entries_read_none() {
        let record = RecordBuilder::new(test_schema()).build();
        // unset nullable and unset non-nullable both read back as None
        assert_eq!(record.get_string("label"), None);
        assert_eq!(record.get_int("id"), None);
    }

    #[test]
    fn test_dynamic_builder_derives_schema() {
        let record = RecordBuilder::dynamic()
            .with_int("an id", 7)
            .unwrap()
            .with_string("label", "x")
            .unwrap()
            .build();
        let entry = record.schema().get_entry("an_id").unwrap();
        assert_eq!(entry.raw_name(), Some("an id"));
        assert_eq!(entry.schema_type(), SchemaType::Int);
        assert!(entry.is_nullable());
        assert_eq!(record.get_int("an_id"), Some(7));
    }

    #[test]
    fn test_dynamic_repeated_write_folds_into_one_entry() {
        let record = RecordBuilder::dynamic()
            .with_string("field", "first")
            .unwrap()
            .with_string("field", "second")
            .unwrap()
            .build();
        assert_eq!(record.schema().all_entries().len(), 1);
        assert_eq!(record.get_string("field"), Some("second"));

        let mismatch = RecordBuilder::dynamic()
            .with_string("field", "first")
            .unwrap()
            .with_int("field", 2);
        assert!(matches!(mismatch, Err(SchemaError::TypeMismatch { .. })));
    }
}
