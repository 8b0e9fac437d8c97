//! Copy-on-write extension of schemas and records
//!
//! Codec adapters frequently need to append or override a handful of fields
//! on their way through a pipeline stage; rebuilding a whole schema or record
//! graph for that is wasteful. The overlay operations here produce a new
//! instance holding a reference to the unchanged base plus a small delta.
//! Extension is an O(delta) allocation with no locking and no shared mutable
//! state.
//!
//! Chained extensions never nest: a new overlay copies its predecessor's base
//! handle and merges deltas, so extension depth is always 0 or 1 regardless
//! of how many operations are chained.

use std::sync::Arc;

use crate::entry::Entry;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

impl Schema {
    /// Extend this schema with additional entries, copy-on-write.
    ///
    /// The returned schema shares this schema's core; the new entries live in
    /// a small delta on top of it, routed into the data or metadata partition
    /// by their metadata flag. Props always delegate to the base and are not
    /// extended.
    ///
    /// A delta entry whose name matches an existing entry REPLACES it in
    /// every read view (keeping the base position) rather than shadowing it
    /// with a duplicate: name uniqueness across both partitions holds for
    /// overlay-extended schemas too. Within a chain, the last write to a name
    /// wins.
    pub fn add_entries(&self, entries: impl IntoIterator<Item = Entry>) -> Schema {
        let mut added = self.added.clone();
        let mut added_metadata = self.added_metadata.clone();
        for entry in entries {
            added.retain(|e| e.name() != entry.name());
            added_metadata.retain(|e| e.name() != entry.name());
            if entry.is_metadata() {
                added_metadata.push(entry);
            } else {
                added.push(entry);
            }
        }
        tracing::debug!(
            added = added.len(),
            added_metadata = added_metadata.len(),
            "extended schema"
        );
        Schema {
            core: Arc::clone(&self.core),
            added,
            added_metadata,
        }
    }
}

impl Record {
    /// Derive a new record with some values overridden or appended,
    /// copy-on-write.
    ///
    /// The delta is consulted before the base on every read; an explicit
    /// `None` is an honored null override. Writes are intentionally not
    /// validated against the schema, because overlays pair with
    /// [`Schema::add_entries`]-extended schemas whose entries the bound
    /// schema does not know about.
    pub fn put(&self, values: impl IntoIterator<Item = (String, Option<Value>)>) -> Record {
        let mut delta = self.delta.clone();
        delta.extend(values);
        Record {
            schema: self.schema.clone(),
            values: Arc::clone(&self.values),
            delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryBuilder;
    use crate::record::RecordBuilder;
    use crate::schema::SchemaBuilder;
    use crate::value::SchemaType;

    fn entry(name: &str, metadata: bool) -> Entry {
        EntryBuilder::new()
            .with_name(name)
            .with_type(SchemaType::String)
            .with_nullable(true)
            .with_metadata(metadata)
            .build()
            .unwrap()
    }

    fn base_schema() -> Schema {
        SchemaBuilder::record()
            .with_entry(entry("field1", false))
            .unwrap()
            .with_entry(entry("field2", false))
            .unwrap()
            .build()
    }

    #[test]
    fn test_add_entries_appends_per_partition() {
        let extended = base_schema().add_entries([entry("extra", false), entry("note", true)]);
        let names: Vec<_> = extended
            .entries()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["field1", "field2", "extra"]);
        assert_eq!(extended.metadata().len(), 1);
        assert_eq!(extended.all_entries().len(), 4);
        assert!(extended.get_entry("note").is_some());
    }

    #[test]
    fn test_chained_extension_stays_flat() {
        let schema = base_schema();
        let mut extended = schema.clone();
        for i in 0..10 {
            extended = extended.add_entries([entry(&format!("e{i}"), false)]);
        }
        // every extension shares the original core: depth never grows
        assert!(Arc::ptr_eq(&schema.core, &extended.core));
        assert_eq!(extended.entries().len(), 12);
    }

    #[test]
    fn test_delta_replaces_base_entry_of_same_name() {
        let replacement = EntryBuilder::new()
            .with_name("field2")
            .with_type(SchemaType::Int)
            .with_nullable(true)
            .build()
            .unwrap();
        let extended = base_schema().add_entries([replacement]);
        assert_eq!(extended.all_entries().len(), 2);
        let field2 = extended.get_entry("field2").unwrap();
        assert_eq!(field2.schema_type(), SchemaType::Int);
        // base position preserved
        let names: Vec<_> = extended
            .entries()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["field1", "field2"]);
    }

    #[test]
    fn test_overlay_props_delegate_to_base() {
        let schema = base_schema();
        let extended = schema.add_entries([entry("note", true), entry("extra", false)]);
        assert_eq!(extended.props(), schema.props());
        assert_eq!(
            extended.prop(crate::schema::ENTRIES_ORDER_PROP),
            Some("field1,field2")
        );
        // overlay entries trail the persisted order, data before metadata
        let ordered: Vec<_> = extended
            .entries_ordered()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(ordered, ["field1", "field2", "extra", "note"]);
    }

    #[test]
    fn test_put_overrides_and_base_is_untouched() {
        let record1 = RecordBuilder::new(base_schema())
            .with_string("field1", "hello")
            .unwrap()
            .build();
        let record2 = record1.put([("field2".to_string(), Some(Value::from("value2")))]);

        assert_ne!(record1, record2);
        assert_eq!(record2.get_string("field1"), Some("hello"));
        assert_eq!(record2.get_string("field2"), Some("value2"));
        assert_eq!(record1.get_string("field2"), None);
    }

    #[test]
    fn test_put_chain_flattens_and_last_write_wins() {
        let base = RecordBuilder::new(base_schema())
            .with_string("field1", "seed")
            .unwrap()
            .build();
        let mut next = base.clone();
        for i in 1..=5 {
            let prev = next.clone();
            next = next.put([
                ("field1".to_string(), Some(Value::String(format!("f1_{i}")))),
                ("field2".to_string(), Some(Value::String(format!("f2_{i}")))),
            ]);
            assert_ne!(prev.get_string("field1"), Some(format!("f1_{i}").as_str()));
            assert_eq!(next.get_string("field1"), Some(format!("f1_{i}").as_str()));
            assert_eq!(next.get_string("field2"), Some(format!("f2_{i}").as_str()));
        }
        // base snapshot is shared, not re-wrapped, across the whole chain
        assert!(Arc::ptr_eq(&base.values, &next.values));
        assert_eq!(next.delta.len(), 2);
    }

    #[test]
    fn test_explicit_null_override_honored() {
        let record = RecordBuilder::new(base_schema())
            .with_string("field1", "set")
            .unwrap()
            .build();
        let cleared = record.put([("field1".to_string(), None)]);
        assert_eq!(cleared.get_string("field1"), None);
        assert_eq!(record.get_string("field1"), Some("set"));
    }
}
