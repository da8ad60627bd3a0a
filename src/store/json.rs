//! JSON-in-TEXT column codec
//!
//! Composite values (tags, skills, weapons, ...) are stored as JSON text.
//! Encoding happens only on the way into SQLite and decoding only on the way
//! out; a stored value that does not parse as the expected shape reads back
//! as the empty value instead of failing the query.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::Result;

/// Encodes a value for a JSON column.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Encodes a nullable JSON column; `None` is stored as SQL `NULL`.
pub fn encode_nullable<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(encode).transpose()
}

/// Decodes a JSON column, substituting `T::default()` for `NULL`, empty text
/// or text that is not valid JSON of the expected shape.
pub fn decode_or_default<T>(column: &str, raw: Option<String>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(column, error = %e, "malformed JSON column, using empty value");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_decode_valid_array() {
        let tags: Vec<String> = decode_or_default("tags", Some(r#"["undead","boss"]"#.into()));
        assert_eq!(tags, vec!["undead".to_string(), "boss".to_string()]);
    }

    #[test]
    fn test_decode_null_and_blank() {
        let tags: Vec<String> = decode_or_default("tags", None);
        assert!(tags.is_empty());
        let tags: Vec<String> = decode_or_default("tags", Some("   ".into()));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_decode_malformed_falls_back() {
        let tags: Vec<String> = decode_or_default("tags", Some("not json [".into()));
        assert!(tags.is_empty());

        // Valid JSON but the wrong shape
        let skills: BTreeMap<String, bool> = decode_or_default("skills", Some("[1,2]".into()));
        assert!(skills.is_empty());
    }

    #[test]
    fn test_encode_nullable() {
        assert_eq!(encode_nullable::<Vec<String>>(None).unwrap(), None);
        let tags = vec!["a".to_string()];
        assert_eq!(
            encode_nullable(Some(&tags)).unwrap().as_deref(),
            Some(r#"["a"]"#)
        );
    }
}
