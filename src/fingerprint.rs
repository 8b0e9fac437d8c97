//! Schema fingerprints for cross-process identity
//!
//! Engines exchanging schemas need a stable identity that survives process
//! boundaries. A fingerprint is the SHA-256 of a schema's canonical wire
//! form; it keys schemas by full structure, unlike the deliberately coarse
//! `Hash` implementation on `Schema` itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::Schema;

/// SHA-256 fingerprint of a schema's canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that a schema still matches this fingerprint.
    pub fn verify(&self, schema: &Schema) -> bool {
        *self == schema.fingerprint()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Schema {
    /// Fingerprint of this schema's canonical wire form. Deterministic:
    /// entry lists are ordered and props maps serialize in key order.
    pub fn fingerprint(&self) -> Fingerprint {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        Fingerprint::from_bytes(canonical.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryBuilder;
    use crate::schema::SchemaBuilder;
    use crate::value::SchemaType;

    fn schema(entry_name: &str) -> Schema {
        SchemaBuilder::record()
            .with_entry(
                EntryBuilder::new()
                    .with_name(entry_name)
                    .with_type(SchemaType::String)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .build()
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(schema("field").fingerprint(), schema("field").fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_structure() {
        let original = schema("field");
        assert_ne!(original.fingerprint(), schema("other").fingerprint());
        assert!(original.fingerprint().verify(&original));
        assert!(!original.fingerprint().verify(&schema("other")));
    }
}
