//! Decoders for retriever-service records.
use super::{DecodeError, Record};
use crate::coerce::to_chunk_state;
use crate::types::retriever::{
    Chunk, ChunkData, Corpus, CustomMetadata, Document, RelevantChunk,
};
use serde_json::Value;

/// Decodes a raw corpus record into a [`Corpus`].
pub fn decode_corpus(value: Value) -> Result<Corpus, DecodeError> {
    let mut record = Record::new("Corpus", value)?;
    Ok(Corpus {
        name: record.require_string("name")?,
        display_name: record.string_or_default("display_name")?,
        create_time: record.take_time("create_time")?,
        update_time: record.take_time("update_time")?,
    })
}

/// Decodes a raw document record into a [`Document`].
pub fn decode_document(value: Value) -> Result<Document, DecodeError> {
    let mut record = Record::new("Document", value)?;
    Ok(Document {
        name: record.require_string("name")?,
        display_name: record.string_or_default("display_name")?,
        custom_metadata: decode_custom_metadata(&mut record)?,
        create_time: record.take_time("create_time")?,
        update_time: record.take_time("update_time")?,
    })
}

/// Decodes a raw chunk record into a [`Chunk`].
///
/// The `data` field accepts a bare string or a `{string_value}` record.
pub fn decode_chunk(value: Value) -> Result<Chunk, DecodeError> {
    let mut record = Record::new("Chunk", value)?;
    let state = to_chunk_state(record.take("state").as_ref());

    let data = match record.take("data") {
        None => return Err(DecodeError::MissingField { kind: "Chunk", field: "data" }),
        Some(Value::String(string_value)) => ChunkData { string_value },
        Some(data @ Value::Object(_)) => {
            let mut data = Record::new("ChunkData", data)?;
            ChunkData {
                string_value: data.require_string("string_value")?,
            }
        }
        Some(other) => {
            return Err(DecodeError::WrongShape {
                kind: "Chunk",
                field: "data",
                value: other.to_string(),
            });
        }
    };

    Ok(Chunk {
        name: record.require_string("name")?,
        data,
        custom_metadata: decode_custom_metadata(&mut record)?,
        state,
        create_time: record.take_time("create_time")?,
        update_time: record.take_time("update_time")?,
    })
}

/// Decodes a query-result entry into a [`RelevantChunk`].
pub fn decode_relevant_chunk(value: Value) -> Result<RelevantChunk, DecodeError> {
    let mut record = Record::new("RelevantChunk", value)?;
    let chunk = record
        .take("chunk")
        .ok_or(DecodeError::MissingField { kind: "RelevantChunk", field: "chunk" })?;
    Ok(RelevantChunk {
        chunk_relevance_score: record.require_f64("chunk_relevance_score")?,
        chunk: decode_chunk(chunk)?,
    })
}

/// Decodes the `relevant_chunks` array of a query response.
pub fn decode_relevant_chunks(value: Value) -> Result<Vec<RelevantChunk>, DecodeError> {
    let mut record = Record::new("QueryResponse", value)?;
    record
        .take_array("relevant_chunks")?
        .into_iter()
        .map(decode_relevant_chunk)
        .collect()
}

/// Decodes the `chunks` array of a batch create/update response.
pub fn decode_chunk_batch(value: Value) -> Result<Vec<Chunk>, DecodeError> {
    let mut record = Record::new("ChunkBatch", value)?;
    record
        .take_array("chunks")?
        .into_iter()
        .map(decode_chunk)
        .collect()
}

fn decode_custom_metadata(record: &mut Record) -> Result<Vec<CustomMetadata>, DecodeError> {
    record
        .take_array("custom_metadata")?
        .into_iter()
        .map(decode_custom_metadata_entry)
        .collect()
}

fn decode_custom_metadata_entry(value: Value) -> Result<CustomMetadata, DecodeError> {
    let mut record = Record::new("CustomMetadata", value)?;

    // string_list_value arrives either as a plain array or wrapped in the
    // wire's {"values": [...]} record.
    let string_list_value = match record.take("string_list_value") {
        None => None,
        Some(value) => Some(decode_string_list(value)?),
    };

    Ok(CustomMetadata {
        key: record.require_string("key")?,
        string_value: record.take_string("string_value")?,
        string_list_value,
        numeric_value: record.take_f64("numeric_value")?,
    })
}

fn decode_string_list(value: Value) -> Result<Vec<String>, DecodeError> {
    let items = match value {
        Value::Array(items) => items,
        value @ Value::Object(_) => {
            let mut wrapper = Record::new("CustomMetadata", value)?;
            wrapper.take_array("values")?
        }
        other => {
            return Err(DecodeError::WrongShape {
                kind: "CustomMetadata",
                field: "string_list_value",
                value: other.to_string(),
            });
        }
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(DecodeError::WrongShape {
                kind: "CustomMetadata",
                field: "string_list_value",
                value: other.to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::retriever::ChunkState;
    use serde_json::json;

    #[test]
    fn corpus_times_are_decoded() {
        let corpus = decode_corpus(json!({
            "name": "corpora/c1",
            "display_name": "Demo",
            "create_time": "2024-01-01T00:00:00Z",
            "update_time": "2024-01-01T00:00:00.5Z",
        }))
        .unwrap();
        assert_eq!(corpus.name, "corpora/c1");
        assert!(corpus.create_time.is_some());
        assert!(corpus.update_time.is_some());
    }

    #[test]
    fn chunk_data_accepts_both_shapes() {
        let bare = decode_chunk(json!({
            "name": "corpora/c1/documents/d1/chunks/k1",
            "data": "hello",
        }))
        .unwrap();
        assert_eq!(bare.data.string_value, "hello");
        assert_eq!(bare.state, ChunkState::Unspecified);

        let wrapped = decode_chunk(json!({
            "name": "corpora/c1/documents/d1/chunks/k1",
            "data": { "string_value": "hello" },
            "state": "ACTIVE",
        }))
        .unwrap();
        assert_eq!(wrapped.data.string_value, "hello");
        assert_eq!(wrapped.state, ChunkState::Active);
    }

    #[test]
    fn chunk_without_data_is_a_schema_error() {
        let err = decode_chunk(json!({ "name": "corpora/c1/documents/d1/chunks/k1" })).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "data", .. }));
    }

    #[test]
    fn custom_metadata_string_list_shapes() {
        let doc = decode_document(json!({
            "name": "corpora/c1/documents/d1",
            "custom_metadata": [
                { "key": "tags", "string_list_value": { "values": ["a", "b"] } },
                { "key": "tags2", "string_list_value": ["c"] },
                { "key": "score", "numeric_value": 1.5 },
            ],
        }))
        .unwrap();
        assert_eq!(doc.custom_metadata[0].string_list_value.as_deref(), Some(["a".to_string(), "b".to_string()].as_slice()));
        assert_eq!(doc.custom_metadata[1].string_list_value.as_deref(), Some(["c".to_string()].as_slice()));
        assert_eq!(doc.custom_metadata[2].numeric_value, Some(1.5));
    }

    #[test]
    fn relevant_chunk_projection() {
        let relevant = decode_relevant_chunk(json!({
            "chunk_relevance_score": 0.75,
            "chunk": {
                "name": "corpora/c1/documents/d1/chunks/k1",
                "data": { "string_value": "hello" },
            },
        }))
        .unwrap();
        assert_eq!(relevant.chunk_relevance_score, 0.75);
        assert_eq!(relevant.chunk.data.string_value, "hello");
    }
}
