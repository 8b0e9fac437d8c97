//! Entry: immutable field descriptor
//!
//! An entry names and types one field of a record schema. Entries are built
//! once through [`EntryBuilder`] and never mutated afterwards; a "changed"
//! entry is a new entry (usually seeded via [`Entry::to_builder`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::sanitize::sanitize_name;
use crate::schema::Schema;
use crate::value::{SchemaType, Value};

/// A single named, typed field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Sanitized field name, unique within its schema.
    name: String,
    /// Original pre-sanitization name, present only if sanitization or
    /// collision resolution changed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_name: Option<String>,
    #[serde(rename = "type")]
    schema_type: SchemaType,
    #[serde(default)]
    nullable: bool,
    /// Metadata entries carry control/descriptive information rather than
    /// payload data; they are excluded from a schema's data partition.
    #[serde(default)]
    metadata: bool,
    /// Opaque default, type-checked against `type` at write time only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<Value>,
    /// Element schema, required for record and array entry types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element_schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    /// Free-form side metadata for codec adapters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    props: BTreeMap<String, String>,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_name(&self) -> Option<&str> {
        self.raw_name.as_deref()
    }

    /// The name the field had before sanitization, falling back to the
    /// sanitized name when nothing changed.
    pub fn original_field_name(&self) -> &str {
        self.raw_name.as_deref().unwrap_or(&self.name)
    }

    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_metadata(&self) -> bool {
        self.metadata
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn element_schema(&self) -> Option<&Schema> {
        self.element_schema.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn props(&self) -> &BTreeMap<String, String> {
        &self.props
    }

    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Fresh builder pre-seeded with this entry.
    pub fn to_builder(&self) -> EntryBuilder {
        EntryBuilder {
            name: Some(self.name.clone()),
            raw_name: self.raw_name.clone(),
            schema_type: Some(self.schema_type),
            nullable: self.nullable,
            metadata: self.metadata,
            default_value: self.default_value.clone(),
            element_schema: self.element_schema.clone(),
            comment: self.comment.clone(),
            props: self.props.clone(),
        }
    }

    /// Copy of this entry under a collision-resolved final name. The raw
    /// name (and everything else, defaults included) rides along unchanged.
    pub(crate) fn renamed(&self, final_name: String) -> Entry {
        let mut renamed = self.clone();
        if renamed.raw_name.is_none() {
            renamed.raw_name = Some(renamed.name.clone());
        }
        renamed.name = final_name;
        renamed
    }
}

/// Builder for [`Entry`].
#[derive(Debug, Default, Clone)]
pub struct EntryBuilder {
    name: Option<String>,
    raw_name: Option<String>,
    schema_type: Option<SchemaType>,
    nullable: bool,
    metadata: bool,
    default_value: Option<Value>,
    element_schema: Option<Schema>,
    comment: Option<String>,
    props: BTreeMap<String, String>,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry name, sanitizing it immediately. When sanitization
    /// changes the name, the original is recorded as the raw name; otherwise
    /// no raw name is stored.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let raw = name.into();
        let sanitized = sanitize_name(&raw);
        if sanitized != raw {
            self.raw_name = Some(raw);
        }
        self.name = Some(sanitized);
        self
    }

    pub fn with_raw_name(mut self, raw_name: impl Into<String>) -> Self {
        self.raw_name = Some(raw_name.into());
        self
    }

    pub fn with_type(mut self, schema_type: SchemaType) -> Self {
        self.schema_type = Some(schema_type);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a default. The value is kept opaque here; it is only checked
    /// against the entry type when written into a record.
    pub fn with_default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_element_schema(mut self, schema: Schema) -> Self {
        self.element_schema = Some(schema);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_props(mut self, props: BTreeMap<String, String>) -> Self {
        self.props.extend(props);
        self
    }

    /// Finalize the descriptor.
    ///
    /// Fails with a configuration error when the name or type is missing,
    /// when a record/array entry lacks an element schema, or when any other
    /// entry type carries one.
    pub fn build(self) -> Result<Entry> {
        let name = self
            .name
            .ok_or_else(|| SchemaError::config("entry name is required"))?;
        let schema_type = self
            .schema_type
            .ok_or_else(|| SchemaError::config(format!("entry '{name}' has no type")))?;
        if schema_type.requires_element_schema() && self.element_schema.is_none() {
            return Err(SchemaError::config(format!(
                "entry '{name}' of type {schema_type:?} requires an element schema"
            )));
        }
        if !schema_type.requires_element_schema() && self.element_schema.is_some() {
            return Err(SchemaError::config(format!(
                "entry '{name}' of type {schema_type:?} cannot carry an element schema"
            )));
        }
        Ok(Entry {
            name,
            raw_name: self.raw_name,
            schema_type,
            nullable: self.nullable,
            metadata: self.metadata,
            default_value: self.default_value,
            element_schema: self.element_schema,
            comment: self.comment,
            props: self.props,
        })
    }
}
