//! Field name sanitization and collision resolution
//!
//! Raw field names arrive from arbitrary upstream systems (database columns,
//! CSV headers, API payloads) and must be normalized into valid identifiers
//! before they can anchor a schema entry. Sanitization alone cannot guarantee
//! uniqueness across a set of raw names, so the collision resolver assigns
//! deterministic `_1`, `_2`, ... suffixes when two raw names normalize to the
//! same identifier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SchemaError};

static VALID_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name pattern"));

/// Whether `name` is already a valid entry identifier.
pub fn is_valid_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

/// Normalize an arbitrary string into a valid identifier.
///
/// Total and fail-safe: the empty string maps to itself, every character
/// outside `[A-Za-z0-9_]` is replaced with `_`, and a leading digit is
/// replaced with `_` (the rest of the string is left as-is, even if those
/// characters are themselves digits). Idempotent for all inputs.
pub fn sanitize_name(raw: &str) -> String {
    if raw.is_empty() || is_valid_name(raw) {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        let valid = c.is_ascii_alphanumeric() || c == '_';
        if !valid || (i == 0 && c.is_ascii_digit()) {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

/// Resolve the final name for an entry entering a schema under construction.
///
/// `candidate` is the sanitized name, `raw_name` the original name when
/// sanitization changed it, and `taken` the `(final_name, raw_name)` pairs of
/// every entry already in the builder, across both partitions.
///
/// Returns the adopted final name, or [`SchemaError::DuplicateEntry`] when an
/// existing entry has the same raw identity (equal raw names, or both
/// natural). Suffix search scans `k = 1, 2, 3, ...` against the current entry
/// set and takes the first free slot; assignments are never revisited.
pub(crate) fn resolve_collision(
    candidate: &str,
    raw_name: Option<&str>,
    taken: &[(String, Option<String>)],
) -> Result<String> {
    let clash = taken.iter().find(|(name, _)| name == candidate);
    let Some((_, existing_raw)) = clash else {
        return Ok(candidate.to_string());
    };
    if existing_raw.as_deref() == raw_name {
        return Err(SchemaError::DuplicateEntry {
            name: candidate.to_string(),
        });
    }
    let mut k = 1u32;
    loop {
        let suffixed = format!("{candidate}_{k}");
        if !taken.iter().any(|(name, _)| *name == suffixed) {
            tracing::debug!(candidate, final_name = %suffixed, "renamed colliding entry");
            return Ok(suffixed);
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_fixed_vectors() {
        assert_eq!(sanitize_name(""), "");
        assert_eq!(sanitize_name("HélloWorld"), "H_lloWorld");
        assert_eq!(sanitize_name(" Hello World "), "_Hello_World_");
        assert_eq!(sanitize_name("123HelloWorld"), "_23HelloWorld");
        assert_eq!(sanitize_name("already_valid_9"), "already_valid_9");
        assert_eq!(sanitize_name("_"), "_");
        assert_eq!(sanitize_name("9"), "_");
    }

    #[test]
    fn test_sanitize_idempotent_on_hostile_input() {
        // Deterministic corpus of char soup: every other Unicode plane slice,
        // control characters, digits in every position.
        let mut corpus: Vec<String> = vec![
            "\u{0}\u{1}\u{2}".into(),
            "päivämäärä".into(),
            "日付".into(),
            "a-b.c d/e".into(),
            "0\u{301}combining".into(),
            "--".into(),
            "1".into(),
            "12".into(),
            "1_".into(),
        ];
        for seed in 0u32..150 {
            let s: String = (0u32..20)
                .map(|i| char::from_u32((seed * 7919 + i * 131) % 0xD7FF).unwrap_or('\u{FFFD}'))
                .collect();
            corpus.push(s);
        }
        for raw in corpus {
            let once = sanitize_name(&raw);
            if !once.is_empty() {
                assert!(is_valid_name(&once), "'{once}' is not a valid identifier");
            }
            assert_eq!(sanitize_name(&once), once, "not a fixed point: '{raw}'");
        }
    }

    #[test]
    fn test_resolution_adopts_free_candidate() {
        let taken = vec![("other".to_string(), None)];
        assert_eq!(resolve_collision("name", None, &taken).unwrap(), "name");
    }

    #[test]
    fn test_resolution_suffixes_on_collision() {
        let taken = vec![
            ("name".to_string(), Some("name?".to_string())),
            ("name_1".to_string(), Some("name!".to_string())),
        ];
        assert_eq!(resolve_collision("name", None, &taken).unwrap(), "name_2");
    }

    #[test]
    fn test_resolution_rejects_same_raw_identity() {
        let taken = vec![("name".to_string(), None)];
        assert!(matches!(
            resolve_collision("name", None, &taken),
            Err(SchemaError::DuplicateEntry { .. })
        ));

        let taken = vec![("name".to_string(), Some("1name".to_string()))];
        assert!(matches!(
            resolve_collision("name", Some("1name"), &taken),
            Err(SchemaError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn test_resolution_takes_first_free_slot() {
        let taken = vec![
            ("name".to_string(), Some("a".to_string())),
            ("name_2".to_string(), None),
        ];
        // k scan starts at 1 and name_1 is free even though name_2 is taken.
        assert_eq!(
            resolve_collision("name", Some("b"), &taken).unwrap(),
            "name_1"
        );
    }
}
