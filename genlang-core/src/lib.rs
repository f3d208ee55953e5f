//! # Genlang Core
//!
//! `genlang-core` is a typed client layer over a remote generative-language
//! platform. It owns the canonical data model (models, tuned models, corpora,
//! documents, chunks), the decoding of raw wire records into that model, and
//! the partial-update machinery (dotted field paths + field masks) used by
//! PATCH-style RPCs. The transport itself is an injected collaborator.
//!
//! ## Key Components
//!
//! * **[`types`]:** The canonical dataclasses returned to callers.
//! * **[`decode`]:** Pure converters from raw wire records
//!   (`serde_json::Value` objects) into the canonical types.
//! * **[`update`]:** Flattening of nested update payloads into dotted field
//!   paths, per-entity setter tables, and field-mask derivation.
//! * **[`tuning`]:** Normalization of the many accepted tuning-data shapes
//!   (dataset, URL, file path, column mapping, example sequence) into one
//!   canonical [`tuning::Dataset`].
//! * **[`retriever`]:** Thin resource façades (corpus/document/chunk) that
//!   build requests, delegate to an injected [`service`] client, and decode
//!   the response. Every operation has a blocking and an `_async` form.
//!
//! ## The service boundary
//!
//! The remote service is represented by the traits in [`service`]. Requests
//! are plain serde-serializable structs; responses are raw JSON wire records.
//! Remote failures surface as [`tonic::Status`] and pass through this layer
//! unmodified: no retries, no backoff, no partial recovery.
//!
//! ## Re-exports
//!
//! This crate re-exports `tonic` so that consumers share the `Status` type
//! used at the service boundary.
pub mod coerce;
pub mod decode;
pub mod name;
pub mod retriever;
pub mod service;
pub mod tuning;
pub mod types;
pub mod update;

// Re-exports
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
