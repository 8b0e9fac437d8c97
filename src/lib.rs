//! Trellis Record Model
//!
//! A self-describing, structurally-typed record model: a [`Schema`] of named,
//! typed, ordered fields and a [`Record`] holding validated values for such a
//! schema. This is the common data currency passed between the heterogeneous
//! processing engines of the Trellis platform: batch pipeline runners,
//! row-oriented legacy engines, wire codecs.
//!
//! ## Guarantees
//!
//! - **Stable field identity**: arbitrary upstream names are sanitized into
//!   valid identifiers with deterministic collision suffixing
//! - **Immutable once published**: schemas, entries, and records are safe for
//!   unsynchronized concurrent reads the moment `build()` returns
//! - **Cheap incremental mutation**: copy-on-write overlays extend a schema
//!   or record in O(delta) without rebuilding the graph
//! - **Detachable ordering**: field order is a policy object, persisted in a
//!   reserved props key, never baked into storage
//!
//! ## Data flow
//!
//! ```text
//! sanitize ──> Entry ──> Schema ──> Record ──> overlay extension
//!                                      │
//!                           codec / engine adapters
//!                          (via the factory seam only)
//! ```
//!
//! Codec adapters sit above all of this and only call the public accessors
//! and builders; none of the internals (collision-suffix scheme, overlay
//! delta layout) are part of the wire contract. The one exception is the
//! reserved ordering key [`schema::ENTRIES_ORDER_PROP`], which codecs must
//! round-trip verbatim.

pub mod entry;
pub mod error;
pub mod factory;
pub mod fingerprint;
pub mod order;
pub mod overlay;
pub mod record;
pub mod sanitize;
pub mod schema;
pub mod value;

pub use entry::{Entry, EntryBuilder};
pub use error::{Result, SchemaError};
pub use factory::{ModelFactory, RecordModelFactory};
pub use fingerprint::Fingerprint;
pub use order::EntriesOrder;
pub use record::{Record, RecordBuilder};
pub use sanitize::{is_valid_name, sanitize_name};
pub use schema::{Schema, SchemaBuilder, ENTRIES_ORDER_PROP};
pub use value::{SchemaType, Value};
