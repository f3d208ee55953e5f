//! Types for the models service: base models, tuned models and their
//! tuning lifecycle records.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`TunedModel`].
///
/// Wire input always resolves to one of these four values; anything
/// unmapped (including absence) becomes [`TunedModelState::Unspecified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunedModelState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "CREATING")]
    Creating,
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "FAILED")]
    Failed,
}

/// An immutable descriptor of a base model.
///
/// Created only by decoding a service response; never mutated locally.
/// Identity is the resource `name` (`models/{base_model_id}-{version}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub base_model_id: String,
    pub version: String,
    pub display_name: String,
    pub description: String,
    pub input_token_limit: i32,
    pub output_token_limit: i32,
    /// Supported API method names, in Pascal case (e.g. `generateMessage`).
    pub supported_generation_methods: Vec<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<i32>,
}

/// A model produced by tuning, plus its tuning lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunedModel {
    /// `tunedModels/{id}`; absent until the model is created.
    pub name: Option<String>,
    /// The model this one was tuned from: either a base model or a
    /// previously tuned model.
    pub source_model: Option<String>,
    /// The base model at the root of the tuning chain.
    pub base_model: Option<String>,
    pub display_name: String,
    pub description: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<f32>,
    pub state: TunedModelState,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub tuning_task: Option<TuningTask>,
}

/// The tuning run that produced a [`TunedModel`]. Owned exclusively by it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningTask {
    pub start_time: Option<DateTime<Utc>>,
    pub complete_time: Option<DateTime<Utc>>,
    /// Point-in-time metrics, in the order the service reported them.
    pub snapshots: Vec<TuningSnapshot>,
    pub hyperparameters: Option<Hyperparameters>,
}

/// An immutable point-in-time tuning metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningSnapshot {
    pub step: i32,
    pub epoch: i32,
    pub mean_score: f32,
    pub compute_time: Option<DateTime<Utc>>,
}

/// Flat hyperparameter value object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub epoch_count: i32,
    pub batch_size: i32,
    pub learning_rate: f32,
}

/// The result of counting tokens against a model's tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    pub token_count: i32,
    pub token_count_limit: i32,
}

impl TokenCount {
    pub fn over_limit(&self) -> bool {
        self.token_count > self.token_count_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_count_flags_only_counts_past_the_limit() {
        let within = TokenCount {
            token_count: 4096,
            token_count_limit: 4096,
        };
        assert!(!within.over_limit());

        let over = TokenCount {
            token_count: 4097,
            token_count_limit: 4096,
        };
        assert!(over.over_limit());
    }
}
