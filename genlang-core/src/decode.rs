//! # Wire Record Decoding
//!
//! Converters from raw wire records (`serde_json::Value` objects, as
//! produced by a JSON-transcoding transport) into the canonical types of
//! [`crate::types`]. Decoders are total and pure: no network calls, no
//! partial results. A record that is missing a required field or carries a
//! wrongly-shaped one fails with a [`DecodeError`] naming the entity kind
//! and field; that indicates a transport/contract mismatch and is not
//! retryable at this layer.
//!
//! Decoders are only ever invoked on raw wire records; feeding them
//! already-canonical data is outside their contract.
pub mod completion;
pub mod model;
pub mod permission;
pub mod retriever;
pub mod time;

pub use completion::decode_completion;
pub use model::{decode_model, decode_tuned_model};
pub use permission::decode_permission;
pub use retriever::{
    decode_chunk, decode_chunk_batch, decode_corpus, decode_document, decode_relevant_chunk,
    decode_relevant_chunks,
};

use crate::coerce::CoerceError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use time::TimeParseError;

/// A wire record did not match the canonical schema.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected a JSON object for {kind}, got: {value}")]
    NotARecord { kind: &'static str, value: String },
    #[error("{kind} record is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("{kind} field '{field}' has the wrong shape: {value}")]
    WrongShape {
        kind: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{kind} field '{field}': {source}")]
    Time {
        kind: &'static str,
        field: &'static str,
        source: TimeParseError,
    },
    #[error(transparent)]
    Coerce(#[from] CoerceError),
}

/// A wire record being consumed field by field.
///
/// Fields are popped as they are decoded, mirroring how the wire layer
/// re-normalizes records in place. JSON `null` is treated as absence
/// throughout.
pub(crate) struct Record {
    kind: &'static str,
    fields: Map<String, Value>,
}

impl Record {
    pub(crate) fn new(kind: &'static str, value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(fields) => Ok(Record { kind, fields }),
            other => Err(DecodeError::NotARecord {
                kind,
                value: other.to_string(),
            }),
        }
    }

    fn wrong_shape(&self, field: &'static str, value: &Value) -> DecodeError {
        DecodeError::WrongShape {
            kind: self.kind,
            field,
            value: value.to_string(),
        }
    }

    fn missing(&self, field: &'static str) -> DecodeError {
        DecodeError::MissingField {
            kind: self.kind,
            field,
        }
    }

    pub(crate) fn take(&mut self, field: &str) -> Option<Value> {
        match self.fields.remove(field) {
            Some(Value::Null) | None => None,
            some => some,
        }
    }

    pub(crate) fn take_string(&mut self, field: &'static str) -> Result<Option<String>, DecodeError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.wrong_shape(field, &other)),
        }
    }

    pub(crate) fn require_string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        self.take_string(field)?.ok_or_else(|| self.missing(field))
    }

    pub(crate) fn string_or_default(&mut self, field: &'static str) -> Result<String, DecodeError> {
        Ok(self.take_string(field)?.unwrap_or_default())
    }

    pub(crate) fn take_i32(&mut self, field: &'static str) -> Result<Option<i32>, DecodeError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => Ok(Some(v as i32)),
                None => Err(self.wrong_shape(field, &Value::Number(n))),
            },
            Some(other) => Err(self.wrong_shape(field, &other)),
        }
    }

    pub(crate) fn require_i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        self.take_i32(field)?.ok_or_else(|| self.missing(field))
    }

    pub(crate) fn take_f64(&mut self, field: &'static str) -> Result<Option<f64>, DecodeError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => Ok(Some(v)),
                None => Err(self.wrong_shape(field, &Value::Number(n))),
            },
            Some(other) => Err(self.wrong_shape(field, &other)),
        }
    }

    pub(crate) fn take_f32(&mut self, field: &'static str) -> Result<Option<f32>, DecodeError> {
        Ok(self.take_f64(field)?.map(|v| v as f32))
    }

    pub(crate) fn require_f64(&mut self, field: &'static str) -> Result<f64, DecodeError> {
        self.take_f64(field)?.ok_or_else(|| self.missing(field))
    }

    pub(crate) fn take_time(
        &mut self,
        field: &'static str,
    ) -> Result<Option<DateTime<Utc>>, DecodeError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::String(raw)) => {
                time::decode_timestamp(&raw).map(Some).map_err(|source| DecodeError::Time {
                    kind: self.kind,
                    field,
                    source,
                })
            }
            Some(other) => Err(self.wrong_shape(field, &other)),
        }
    }

    pub(crate) fn take_array(&mut self, field: &'static str) -> Result<Vec<Value>, DecodeError> {
        match self.take(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(self.wrong_shape(field, &other)),
        }
    }

    pub(crate) fn take_string_array(
        &mut self,
        field: &'static str,
    ) -> Result<Vec<String>, DecodeError> {
        self.take_array(field)?
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(self.wrong_shape(field, &other)),
            })
            .collect()
    }

    /// Pops a nested record, propagating this record's kind tag.
    pub(crate) fn take_record(&mut self, field: &'static str) -> Result<Option<Record>, DecodeError> {
        match self.take(field) {
            None => Ok(None),
            Some(value @ Value::Object(_)) => Ok(Some(Record::new(self.kind, value)?)),
            Some(other) => Err(self.wrong_shape(field, &other)),
        }
    }
}
