//! Schema: immutable field catalogue
//!
//! A schema is the self-describing shape of a record: an ordered catalogue of
//! entries partitioned into payload data and metadata, plus a free-form props
//! map. Schemas are built once through [`SchemaBuilder`] and are structurally
//! immutable afterwards, safe to share across worker threads and serialize
//! across engine boundaries. Incremental evolution goes through
//! [`Schema::to_builder`] (full rebuild) or [`Schema::add_entries`]
//! (copy-on-write extension, see the overlay module).

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entry::Entry;
use crate::error::{Result, SchemaError};
use crate::order::EntriesOrder;
use crate::sanitize::resolve_collision;
use crate::value::SchemaType;

/// Reserved props key holding the persisted field order, comma-joined.
///
/// This key is the on-the-wire representation of field order: any codec that
/// serializes schema metadata must read and write it verbatim to preserve
/// ordering across a round trip.
pub const ENTRIES_ORDER_PROP: &str = "trellis.fields.order";

/// Shared immutable core of a schema. Overlay-extended schemas point at the
/// same core; it never wraps another core, so extension depth is bounded.
#[derive(Debug)]
pub(crate) struct SchemaCore {
    pub(crate) schema_type: SchemaType,
    pub(crate) element_schema: Option<Schema>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) metadata: Vec<Entry>,
    pub(crate) props: BTreeMap<String, String>,
    /// Default ordering, computed once from the persisted props at
    /// construction. Deterministic from immutable inputs.
    pub(crate) default_order: EntriesOrder,
}

/// An immutable, self-describing record shape.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) core: Arc<SchemaCore>,
    /// Copy-on-write data entries added on top of the core.
    pub(crate) added: Vec<Entry>,
    /// Copy-on-write metadata entries added on top of the core.
    pub(crate) added_metadata: Vec<Entry>,
}

impl Schema {
    pub(crate) fn from_parts(
        schema_type: SchemaType,
        element_schema: Option<Schema>,
        entries: Vec<Entry>,
        metadata: Vec<Entry>,
        mut props: BTreeMap<String, String>,
    ) -> Self {
        let order_prop = match props.get(ENTRIES_ORDER_PROP) {
            Some(existing) if !existing.is_empty() => existing.clone(),
            _ => {
                let joined = metadata
                    .iter()
                    .chain(entries.iter())
                    .map(|e| e.name().to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                props.insert(ENTRIES_ORDER_PROP.to_string(), joined.clone());
                joined
            }
        };
        Schema {
            core: Arc::new(SchemaCore {
                schema_type,
                element_schema,
                entries,
                metadata,
                props,
                default_order: EntriesOrder::of(&order_prop),
            }),
            added: Vec::new(),
            added_metadata: Vec::new(),
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        self.core.schema_type
    }

    /// Element schema; populated only for array schemas.
    pub fn element_schema(&self) -> Option<&Schema> {
        self.core.element_schema.as_ref()
    }

    /// Payload data entries, metadata excluded.
    pub fn entries(&self) -> Vec<&Entry> {
        self.effective_entries()
            .into_iter()
            .filter(|e| !e.is_metadata())
            .collect()
    }

    /// Metadata entries only.
    pub fn metadata(&self) -> Vec<&Entry> {
        self.effective_entries()
            .into_iter()
            .filter(|e| e.is_metadata())
            .collect()
    }

    /// Every entry across both partitions: core metadata, core data, then
    /// overlay additions.
    pub fn all_entries(&self) -> Vec<&Entry> {
        self.effective_entries()
    }

    /// Look up an entry by final name in either partition. Overlay additions
    /// take precedence over core entries of the same name.
    pub fn get_entry(&self, name: &str) -> Option<&Entry> {
        self.overlay_entry(name).or_else(|| {
            self.core
                .metadata
                .iter()
                .chain(self.core.entries.iter())
                .find(|e| e.name() == name)
        })
    }

    /// Props always come from the core; overlay extension does not touch
    /// them.
    pub fn props(&self) -> &BTreeMap<String, String> {
        &self.core.props
    }

    pub fn prop(&self, key: &str) -> Option<&str> {
        self.core.props.get(key).map(String::as_str)
    }

    /// All entries in the schema's persisted default order. Overlay
    /// additions are absent from the persisted order and trail behind it.
    pub fn entries_ordered(&self) -> Vec<&Entry> {
        self.core.default_order.apply(self.effective_entries())
    }

    /// All entries under an ad hoc ordering. Names missing from the ordering
    /// keep the schema's own default order and trail behind; ordering names
    /// absent from the schema are ignored. The schema itself is untouched.
    pub fn entries_ordered_with(&self, order: &EntriesOrder) -> Vec<&Entry> {
        order.apply(self.entries_ordered())
    }

    /// All entries under an ad hoc comparator, ties keeping default order.
    pub fn entries_sorted_by(
        &self,
        mut compare: impl FnMut(&Entry, &Entry) -> std::cmp::Ordering,
    ) -> Vec<&Entry> {
        let mut ordered = self.entries_ordered();
        ordered.sort_by(|a, b| compare(a, b));
        ordered
    }

    /// Clone of the cached default ordering, detached from this schema.
    pub fn natural_order(&self) -> EntriesOrder {
        self.core.default_order.clone()
    }

    /// Fresh builder pre-seeded with this schema's entries in persisted
    /// order, for incremental evolution.
    pub fn to_builder(&self) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new(self.schema_type());
        builder.element_schema = self.element_schema().cloned();
        builder.props = self.props().clone();
        for entry in self.entries_ordered() {
            builder.order.push(entry.name());
            if entry.is_metadata() {
                builder.metadata.push(entry.clone());
            } else {
                builder.entries.push(entry.clone());
            }
        }
        builder
    }

    /// Parse a schema from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Schema> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render this schema's JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Effective entry view: core metadata then core data, each replaced by
    /// an overlay entry of the same name when present, then genuinely new
    /// overlay entries in addition order (data before metadata).
    fn effective_entries(&self) -> Vec<&Entry> {
        let core_len = self.core.metadata.len() + self.core.entries.len();
        let mut out = Vec::with_capacity(core_len + self.added.len() + self.added_metadata.len());
        for entry in self.core.metadata.iter().chain(self.core.entries.iter()) {
            out.push(self.overlay_entry(entry.name()).unwrap_or(entry));
        }
        for entry in self.added.iter().chain(self.added_metadata.iter()) {
            if !self.in_core(entry.name()) {
                out.push(entry);
            }
        }
        out
    }

    fn overlay_entry(&self, name: &str) -> Option<&Entry> {
        self.added
            .iter()
            .chain(self.added_metadata.iter())
            .find(|e| e.name() == name)
    }

    fn in_core(&self, name: &str) -> bool {
        self.core
            .metadata
            .iter()
            .chain(self.core.entries.iter())
            .any(|e| e.name() == name)
    }
}

impl PartialEq for Schema {
    /// Structural equality over type, element schema, both effective entry
    /// partitions, and props.
    fn eq(&self, other: &Self) -> bool {
        self.schema_type() == other.schema_type()
            && self.element_schema() == other.element_schema()
            && self.entries() == other.entries()
            && self.metadata() == other.metadata()
            && self.props() == other.props()
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    /// Deliberately coarse: type, element schema, and the joined entry-name
    /// sequences only. Structurally different schemas sharing a name sequence
    /// may collide; full identity keying is what [`Schema::fingerprint`]
    /// (see the fingerprint module) is for.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_type().hash(state);
        self.element_schema().hash(state);
        let data_names = self
            .entries()
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(",");
        let metadata_names = self
            .metadata()
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(",");
        data_names.hash(state);
        metadata_names.hash(state);
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Schema", 5)?;
        state.serialize_field("type", &self.schema_type())?;
        if self.element_schema().is_some() {
            state.serialize_field("element_schema", &self.element_schema())?;
        } else {
            state.skip_field("element_schema")?;
        }
        state.serialize_field("entries", &self.entries())?;
        state.serialize_field("metadata", &self.metadata())?;
        state.serialize_field("props", self.props())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawSchema {
            #[serde(rename = "type")]
            schema_type: SchemaType,
            #[serde(default)]
            element_schema: Option<Schema>,
            #[serde(default)]
            entries: Vec<Entry>,
            #[serde(default)]
            metadata: Vec<Entry>,
            #[serde(default)]
            props: BTreeMap<String, String>,
        }

        let raw = RawSchema::deserialize(deserializer)?;
        Ok(Schema::from_parts(
            raw.schema_type,
            raw.element_schema,
            raw.entries,
            raw.metadata,
            raw.props,
        ))
    }
}

/// Builder for [`Schema`].
///
/// The schema type is fixed at construction, so every subsequent operation is
/// checked against it; there is no way to re-type a builder that already
/// holds entries. Builders are single-owner mutable state; build snapshots
/// are immutable and never affected by further builder mutation.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema_type: SchemaType,
    element_schema: Option<Schema>,
    entries: Vec<Entry>,
    metadata: Vec<Entry>,
    props: BTreeMap<String, String>,
    order: EntriesOrder,
}

impl SchemaBuilder {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            element_schema: None,
            entries: Vec::new(),
            metadata: Vec::new(),
            props: BTreeMap::new(),
            order: EntriesOrder::default(),
        }
    }

    /// Builder for a record schema.
    pub fn record() -> Self {
        Self::new(SchemaType::Record)
    }

    /// Builder for an array schema.
    pub fn array() -> Self {
        Self::new(SchemaType::Array)
    }

    /// Set the element schema. Only valid on array builders.
    pub fn with_element_schema(mut self, schema: Schema) -> Result<Self> {
        if self.schema_type != SchemaType::Array {
            return Err(SchemaError::config(
                "an element schema is only valid for array schemas",
            ));
        }
        self.element_schema = Some(schema);
        Ok(self)
    }

    /// Add an entry, resolving name collisions per the sanitizer rules and
    /// routing it into the data or metadata partition.
    pub fn with_entry(mut self, entry: Entry) -> Result<Self> {
        self.insert_entry(entry)?;
        Ok(self)
    }

    /// Add an entry, then move it immediately before `pivot`. The pivot must
    /// already exist in this builder; nothing is mutated when it does not.
    pub fn with_entry_before(mut self, pivot: &str, entry: Entry) -> Result<Self> {
        self.check_pivot(pivot)?;
        let name = self.insert_entry(entry)?;
        self.order.move_before(pivot, &name)?;
        Ok(self)
    }

    /// Add an entry, then move it immediately after `pivot`. The pivot must
    /// already exist in this builder; nothing is mutated when it does not.
    pub fn with_entry_after(mut self, pivot: &str, entry: Entry) -> Result<Self> {
        self.check_pivot(pivot)?;
        let name = self.insert_entry(entry)?;
        self.order.move_after(pivot, &name)?;
        Ok(self)
    }

    /// Remove the entry with this final name from whichever partition owns
    /// it.
    pub fn remove(mut self, name: &str) -> Result<Self> {
        let in_data = self.entries.iter().position(|e| e.name() == name);
        let in_metadata = self.metadata.iter().position(|e| e.name() == name);
        match (in_data, in_metadata) {
            (Some(i), _) => {
                self.entries.remove(i);
            }
            (_, Some(i)) => {
                self.metadata.remove(i);
            }
            (None, None) => {
                return Err(SchemaError::UnknownEntry {
                    name: name.to_string(),
                })
            }
        }
        self.order.remove(name);
        Ok(self)
    }

    /// Remove by entry; equivalent to removing its final name.
    pub fn remove_entry(self, entry: &Entry) -> Result<Self> {
        self.remove(entry.name())
    }

    /// Reposition `name` immediately before `pivot` in the pending order.
    pub fn move_before(mut self, pivot: &str, name: &str) -> Result<Self> {
        self.order.move_before(pivot, name)?;
        Ok(self)
    }

    /// Reposition `name` immediately after `pivot` in the pending order.
    pub fn move_after(mut self, pivot: &str, name: &str) -> Result<Self> {
        self.order.move_after(pivot, name)?;
        Ok(self)
    }

    /// Exchange the positions of two names in the pending order.
    pub fn swap(mut self, a: &str, b: &str) -> Result<Self> {
        self.order.swap(a, b)?;
        Ok(self)
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_props(mut self, props: BTreeMap<String, String>) -> Self {
        self.props.extend(props);
        self
    }

    /// Snapshot an immutable schema. The pending order is persisted under
    /// [`ENTRIES_ORDER_PROP`]; the builder stays usable and its further
    /// mutation never affects the returned schema.
    pub fn build(&mut self) -> Schema {
        self.props
            .insert(ENTRIES_ORDER_PROP.to_string(), self.order.to_prop());
        tracing::debug!(
            schema_type = ?self.schema_type,
            entries = self.entries.len() + self.metadata.len(),
            "built schema"
        );
        Schema::from_parts(
            self.schema_type,
            self.element_schema.clone(),
            self.entries.clone(),
            self.metadata.clone(),
            self.props.clone(),
        )
    }

    /// Insert an entry and return its collision-resolved final name.
    pub(crate) fn insert_entry(&mut self, entry: Entry) -> Result<String> {
        if self.schema_type != SchemaType::Record {
            return Err(SchemaError::config(
                "entries are only valid for record schemas",
            ));
        }
        let taken: Vec<(String, Option<String>)> = self
            .entries
            .iter()
            .chain(self.metadata.iter())
            .map(|e| (e.name().to_string(), e.raw_name().map(String::from)))
            .collect();
        let final_name = resolve_collision(entry.name(), entry.raw_name(), &taken)?;
        let resolved = if final_name == entry.name() {
            entry
        } else {
            entry.renamed(final_name.clone())
        };
        self.order.push(resolved.name());
        if resolved.is_metadata() {
            self.metadata.push(resolved);
        } else {
            self.entries.push(resolved);
        }
        Ok(final_name)
    }

    /// Entry already present under the same raw identity, if any. Used by
    /// the dynamic record builder to fold repeated writes into one entry.
    pub(crate) fn find_identity(&self, name: &str, raw_name: Option<&str>) -> Option<&Entry> {
        self.entries
            .iter()
            .chain(self.metadata.iter())
            .find(|e| e.name() == name && e.raw_name() == raw_name)
    }

    fn check_pivot(&self, pivot: &str) -> Result<()> {
        if self.order.names().iter().any(|n| n == pivot) {
            Ok(())
        } else {
            Err(SchemaError::UnknownEntry {
                name: pivot.to_string(),
            })
        }
    }
}
