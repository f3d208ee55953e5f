//! Query-result projections for text generation.
use serde::{Deserialize, Serialize};

/// One candidate completion produced by the model.
///
/// Safety ratings and citation metadata are carried as opaque wire values;
/// this layer does not interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextCompletion {
    pub output: String,
    pub safety_ratings: Vec<serde_json::Value>,
    pub citation_metadata: Option<serde_json::Value>,
}

/// The result of a text-generation call. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// All candidate completions, in the order the service returned them.
    pub candidates: Vec<TextCompletion>,
    /// The first candidate's output, if any.
    pub result: Option<String>,
    /// Reasons why content may have been blocked.
    pub filters: Vec<serde_json::Value>,
    /// Which safety settings blocked content in this result.
    pub safety_feedback: Vec<serde_json::Value>,
}
