//! Types for the retriever service: corpora, documents, chunks, and the
//! metadata filters used to query them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comparison operator of a query [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "OPERATOR_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "LESS")]
    Less,
    #[serde(rename = "LESS_EQUAL")]
    LessEqual,
    #[serde(rename = "EQUAL")]
    Equal,
    #[serde(rename = "GREATER_EQUAL")]
    GreaterEqual,
    #[serde(rename = "NOT_EQUAL")]
    NotEqual,
    #[serde(rename = "INCLUDES")]
    Includes,
    #[serde(rename = "EXCLUDES")]
    Excludes,
}

/// Lifecycle state of a [`Chunk`].
///
/// Unmapped or absent wire input resolves to [`ChunkState::Unspecified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STATE_PENDING_PROCESSING")]
    PendingProcessing,
    #[serde(rename = "STATE_ACTIVE")]
    Active,
    #[serde(rename = "STATE_FAILED")]
    Failed,
}

/// A collection of [`Document`]s, owned by reference (not embedded).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub name: String,
    pub display_name: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

/// A collection of [`Chunk`]s within a [`Corpus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub display_name: String,
    pub custom_metadata: Vec<CustomMetadata>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

/// The text payload of a [`Chunk`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkData {
    pub string_value: String,
}

impl From<&str> for ChunkData {
    fn from(string_value: &str) -> Self {
        ChunkData {
            string_value: string_value.to_string(),
        }
    }
}

impl From<String> for ChunkData {
    fn from(string_value: String) -> Self {
        ChunkData { string_value }
    }
}

/// A unit of retrievable text within a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub name: String,
    pub data: ChunkData,
    pub custom_metadata: Vec<CustomMetadata>,
    pub state: ChunkState,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

/// User-provided key/value metadata attached to documents and chunks.
///
/// Exactly one of the value fields is meant to be populated. This layer does
/// not enforce the exclusivity; the server rejects malformed combinations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomMetadata {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_list_value: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
}

impl CustomMetadata {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        CustomMetadata {
            key: key.into(),
            string_value: Some(value.into()),
            ..CustomMetadata::default()
        }
    }

    pub fn string_list(key: impl Into<String>, values: Vec<String>) -> Self {
        CustomMetadata {
            key: key.into(),
            string_list_value: Some(values),
            ..CustomMetadata::default()
        }
    }

    pub fn numeric(key: impl Into<String>, value: f64) -> Self {
        CustomMetadata {
            key: key.into(),
            numeric_value: Some(value),
            ..CustomMetadata::default()
        }
    }
}

/// A condition value: metadata comparisons work over strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    String(String),
    Number(f64),
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::String(value.to_string())
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        ConditionValue::Number(value)
    }
}

/// One comparison within a [`MetadataFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub value: ConditionValue,
    pub operation: Operator,
}

/// A per-key filter applied to chunk metadata during queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub key: String,
    pub conditions: Vec<Condition>,
}

/// A query-result projection: a chunk plus its relevance to the query.
/// Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantChunk {
    pub chunk_relevance_score: f64,
    pub chunk: Chunk,
}
