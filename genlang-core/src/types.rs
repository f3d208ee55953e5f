//! # Canonical Data Model
//!
//! The decoded, language-native representation of every wire-format record
//! this layer handles. Entities are created by decoding a service response
//! (see [`crate::decode`]) or by callers assembling request payloads; the
//! only sanctioned mutation path is [`crate::update`].
pub mod completion;
pub mod model;
pub mod permission;
pub mod retriever;

pub use completion::{Completion, TextCompletion};
pub use model::{
    Hyperparameters, Model, TokenCount, TunedModel, TunedModelState, TuningSnapshot,
    TuningTask,
};
pub use permission::{GranteeType, Permission, Role};
pub use retriever::{
    Chunk, ChunkData, ChunkState, Condition, ConditionValue, Corpus, CustomMetadata, Document,
    MetadataFilter, Operator, RelevantChunk,
};
