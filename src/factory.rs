//! Factory seam for codec and engine adapters
//!
//! Adapters that translate this model into an engine's native representation
//! construct schemas and records exclusively through this abstraction, which
//! keeps them decoupled from concrete builder types.

use crate::entry::EntryBuilder;
use crate::record::RecordBuilder;
use crate::schema::{Schema, SchemaBuilder};
use crate::value::SchemaType;

/// Builder factory handed to codec/engine adapters.
pub trait ModelFactory {
    /// Builder for a schema of the given type.
    fn schema_builder(&self, schema_type: SchemaType) -> SchemaBuilder;

    /// Builder for a single entry descriptor.
    fn entry_builder(&self) -> EntryBuilder;

    /// Validated record builder bound to `schema`.
    fn record_builder(&self, schema: &Schema) -> RecordBuilder;

    /// Schema-less record builder that infers its schema from written
    /// values.
    fn dynamic_record_builder(&self) -> RecordBuilder;
}

/// Default factory producing the in-memory model types.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordModelFactory;

impl ModelFactory for RecordModelFactory {
    fn schema_builder(&self, schema_type: SchemaType) -> SchemaBuilder {
        SchemaBuilder::new(schema_type)
    }

    fn entry_builder(&self) -> EntryBuilder {
        EntryBuilder::new()
    }

    fn record_builder(&self, schema: &Schema) -> RecordBuilder {
        RecordBuilder::new(schema.clone())
    }

    fn dynamic_record_builder(&self) -> RecordBuilder {
        RecordBuilder::dynamic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_round_trip() {
        let factory = RecordModelFactory;
        let field = factory
            .entry_builder()
            .with_name("field1")
            .with_type(SchemaType::String)
            .with_nullable(true)
            .build()
            .unwrap();
        let schema = factory
            .schema_builder(SchemaType::Record)
            .with_entry(field)
            .unwrap()
            .build();
        let record = factory
            .record_builder(&schema)
            .with_string("field1", "hello")
            .unwrap()
            .build();
        assert_eq!(record.get_string("field1"), Some("hello"));
    }
}
