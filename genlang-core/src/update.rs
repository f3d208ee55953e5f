//! # Partial Updates and Field Masks
//!
//! Update payloads arrive as a mapping of dotted field paths to values
//! (`"data.string_value"`), possibly with nested objects still folded in
//! (`{"data": {"string_value": "x"}}`). A flattening pre-pass expands every
//! nested object into dotted leaf paths, preserving insertion order, and the
//! resulting path sequence doubles as the RPC field mask.
//!
//! Each entity kind exposes a fixed setter table ([`Patchable`]); paths
//! outside it are rejected before anything is mutated, so an update either
//! applies completely or not at all.
use crate::types::retriever::{Chunk, Corpus, Document};
use serde_json::{Map, Value};

/// The ordered, non-deduplicated field paths of an update request.
pub type FieldMask = Vec<String>;

/// Errors produced while validating an update payload.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("field '{path}' of {kind} cannot be updated; updatable fields: {allowed:?}")]
    DisallowedPath {
        kind: &'static str,
        path: String,
        allowed: &'static [&'static str],
    },
    #[error("field '{path}' of {kind} expects a string, got: {value}")]
    NotAString {
        kind: &'static str,
        path: String,
        value: String,
    },
}

/// Expands nested objects in an update payload into dotted leaf paths.
///
/// `{"data": {"string_value": "x"}}` becomes `[("data.string_value", "x")]`.
/// Leaf order follows the payload's insertion order, depth first.
pub fn flatten_update_paths(updates: Map<String, Value>) -> Vec<(String, Value)> {
    let mut flat = Vec::new();
    flatten_into(None, updates, &mut flat);
    flat
}

fn flatten_into(prefix: Option<&str>, updates: Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, value) in updates {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&path), nested, out),
            leaf => out.push((path, leaf)),
        }
    }
}

/// An entity kind with a fixed table of updatable fields.
///
/// The setter table makes the set of valid paths a compile-time enumerable
/// match rather than a runtime string allow-list. Every updatable leaf on
/// the current API surface is a string.
pub trait Patchable {
    const KIND: &'static str;
    const UPDATABLE: &'static [&'static str];

    /// Returns the setter for `path`, or `None` if the path is not
    /// updatable on this kind.
    fn setter(path: &str) -> Option<fn(&mut Self, String)>;
}

impl Patchable for Corpus {
    const KIND: &'static str = "Corpus";
    const UPDATABLE: &'static [&'static str] = &["display_name"];

    fn setter(path: &str) -> Option<fn(&mut Self, String)> {
        match path {
            "display_name" => Some(|corpus, value| corpus.display_name = value),
            _ => None,
        }
    }
}

impl Patchable for Document {
    const KIND: &'static str = "Document";
    const UPDATABLE: &'static [&'static str] = &["display_name"];

    fn setter(path: &str) -> Option<fn(&mut Self, String)> {
        match path {
            "display_name" => Some(|document, value| document.display_name = value),
            _ => None,
        }
    }
}

impl Patchable for Chunk {
    const KIND: &'static str = "Chunk";
    const UPDATABLE: &'static [&'static str] = &["data.string_value"];

    fn setter(path: &str) -> Option<fn(&mut Self, String)> {
        match path {
            "data.string_value" => Some(|chunk, value| chunk.data.string_value = value),
            _ => None,
        }
    }
}

/// Applies an update payload to an entity and derives the field mask.
///
/// Every flattened path and value is validated before the first mutation;
/// a disallowed path or non-string value leaves the entity untouched. The
/// returned mask lists the flattened paths in payload order, without
/// deduplication.
pub fn apply_update_paths<T: Patchable>(
    entity: &mut T,
    updates: Map<String, Value>,
) -> Result<FieldMask, UpdateError> {
    let flat = flatten_update_paths(updates);

    let mut ops = Vec::with_capacity(flat.len());
    for (path, value) in flat {
        let set = T::setter(&path).ok_or_else(|| UpdateError::DisallowedPath {
            kind: T::KIND,
            path: path.clone(),
            allowed: T::UPDATABLE,
        })?;
        let Value::String(text) = value else {
            return Err(UpdateError::NotAString {
                kind: T::KIND,
                path,
                value: value.to_string(),
            });
        };
        ops.push((path, set, text));
    }

    let mut mask = FieldMask::with_capacity(ops.len());
    for (path, set, text) in ops {
        set(entity, text);
        mask.push(path);
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::retriever::ChunkData;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test payloads are objects"),
        }
    }

    #[test]
    fn flattening_preserves_insertion_order() {
        let flat = flatten_update_paths(payload(json!({
            "display_name": "x",
            "data": { "string_value": "hi" },
        })));
        let paths: Vec<_> = flat.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, ["display_name", "data.string_value"]);
    }

    #[test]
    fn nested_chunk_update_produces_dotted_mask() {
        let mut chunk = Chunk {
            name: "corpora/c1/documents/d1/chunks/k1".to_string(),
            data: ChunkData::from("old"),
            ..Chunk::default()
        };
        let mask = apply_update_paths(
            &mut chunk,
            payload(json!({ "data": { "string_value": "hi" } })),
        )
        .unwrap();
        assert_eq!(mask, ["data.string_value"]);
        assert_eq!(chunk.data.string_value, "hi");
    }

    #[test]
    fn disallowed_paths_are_rejected_atomically() {
        let mut document = Document {
            name: "corpora/c1/documents/d1".to_string(),
            display_name: "before".to_string(),
            ..Document::default()
        };
        let err = apply_update_paths(
            &mut document,
            payload(json!({ "display_name": "x", "bogus": "y" })),
        )
        .unwrap_err();
        assert!(matches!(err, UpdateError::DisallowedPath { ref path, .. } if path == "bogus"));
        // The valid path listed first must not have been applied.
        assert_eq!(document.display_name, "before");
    }

    #[test]
    fn non_string_values_are_rejected_atomically() {
        let mut corpus = Corpus {
            name: "corpora/c1".to_string(),
            display_name: "before".to_string(),
            ..Corpus::default()
        };
        let err =
            apply_update_paths(&mut corpus, payload(json!({ "display_name": 7 }))).unwrap_err();
        assert!(matches!(err, UpdateError::NotAString { .. }));
        assert_eq!(corpus.display_name, "before");
    }

    #[test]
    fn mask_is_not_deduplicated() {
        let mut corpus = Corpus::default();
        let mask =
            apply_update_paths(&mut corpus, payload(json!({ "display_name": "x" }))).unwrap();
        assert_eq!(mask, ["display_name"]);
    }
}
