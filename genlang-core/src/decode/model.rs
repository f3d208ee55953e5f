//! Decoders for model-service records.
use super::{DecodeError, Record};
use crate::coerce::to_tuned_model_state;
use crate::types::model::{Hyperparameters, Model, TunedModel, TuningSnapshot, TuningTask};
use serde_json::Value;

/// Decodes a raw model record into a [`Model`].
pub fn decode_model(value: Value) -> Result<Model, DecodeError> {
    let mut record = Record::new("Model", value)?;
    Ok(Model {
        name: record.require_string("name")?,
        base_model_id: record.string_or_default("base_model_id")?,
        version: record.string_or_default("version")?,
        display_name: record.string_or_default("display_name")?,
        description: record.string_or_default("description")?,
        input_token_limit: record.take_i32("input_token_limit")?.unwrap_or(0),
        output_token_limit: record.take_i32("output_token_limit")?.unwrap_or(0),
        supported_generation_methods: record.take_string_array("supported_generation_methods")?,
        temperature: record.take_f32("temperature")?,
        top_p: record.take_f32("top_p")?,
        top_k: record.take_i32("top_k")?,
    })
}

/// Decodes a raw tuned-model record into a [`TunedModel`].
///
/// Reconciles the two mutually exclusive legacy source fields: when
/// `base_model` is present both canonical fields equal it; when
/// `tuned_model_source` is present instead, `base_model` comes from its
/// nested base and `source_model` from its nested tuned name.
pub fn decode_tuned_model(value: Value) -> Result<TunedModel, DecodeError> {
    let mut record = Record::new("TunedModel", value)?;

    let state = to_tuned_model_state(record.take("state").as_ref());

    let legacy_base = record.take_string("base_model")?;
    let source_record = record.take_record("tuned_model_source")?;
    let (base_model, source_model) = match (legacy_base, source_record) {
        (Some(base), _) => (Some(base.clone()), Some(base)),
        (None, Some(mut source)) => (
            source.take_string("base_model")?,
            source.take_string("tuned_model")?,
        ),
        (None, None) => (None, None),
    };

    let tuning_task = match record.take_record("tuning_task")? {
        None => None,
        Some(task) => Some(decode_tuning_task(task)?),
    };

    Ok(TunedModel {
        name: record.take_string("name")?,
        source_model,
        base_model,
        display_name: record.string_or_default("display_name")?,
        description: record.string_or_default("description")?,
        temperature: record.take_f32("temperature")?,
        top_p: record.take_f32("top_p")?,
        top_k: record.take_f32("top_k")?,
        state,
        create_time: record.take_time("create_time")?,
        update_time: record.take_time("update_time")?,
        tuning_task,
    })
}

fn decode_tuning_task(mut record: Record) -> Result<TuningTask, DecodeError> {
    let hyperparameters = match record.take_record("hyperparameters")? {
        None => None,
        Some(mut h) => Some(Hyperparameters {
            epoch_count: h.take_i32("epoch_count")?.unwrap_or(0),
            batch_size: h.take_i32("batch_size")?.unwrap_or(0),
            learning_rate: h.take_f32("learning_rate")?.unwrap_or(0.0),
        }),
    };

    let snapshots = record
        .take_array("snapshots")?
        .into_iter()
        .map(decode_snapshot)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TuningTask {
        start_time: record.take_time("start_time")?,
        complete_time: record.take_time("complete_time")?,
        snapshots,
        hyperparameters,
    })
}

fn decode_snapshot(value: Value) -> Result<TuningSnapshot, DecodeError> {
    let mut record = Record::new("TuningSnapshot", value)?;
    Ok(TuningSnapshot {
        step: record.require_i32("step")?,
        epoch: record.require_i32("epoch")?,
        mean_score: record.require_f64("mean_score")? as f32,
        compute_time: record.take_time("compute_time")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::model::TunedModelState;
    use serde_json::json;

    #[test]
    fn model_requires_a_name() {
        let err = decode_model(json!({ "display_name": "Chat Bison" })).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "name", .. }));
    }

    #[test]
    fn model_defaults() {
        let model = decode_model(json!({
            "name": "models/chat-bison-001",
            "base_model_id": "chat-bison",
            "version": "001",
            "supported_generation_methods": ["generateMessage"],
            "temperature": 0.7,
        }))
        .unwrap();
        assert_eq!(model.input_token_limit, 0);
        assert_eq!(model.temperature, Some(0.7));
        assert_eq!(model.top_k, None);
        assert_eq!(model.supported_generation_methods, vec!["generateMessage"]);
    }

    #[test]
    fn base_model_wins_source_reconciliation() {
        let tuned = decode_tuned_model(json!({
            "name": "tunedModels/t",
            "base_model": "models/b",
        }))
        .unwrap();
        assert_eq!(tuned.base_model.as_deref(), Some("models/b"));
        assert_eq!(tuned.source_model.as_deref(), Some("models/b"));
    }

    #[test]
    fn tuned_model_source_reconciliation() {
        let tuned = decode_tuned_model(json!({
            "name": "tunedModels/t",
            "tuned_model_source": {
                "base_model": "models/b",
                "tuned_model": "tunedModels/parent",
            },
        }))
        .unwrap();
        assert_eq!(tuned.base_model.as_deref(), Some("models/b"));
        assert_eq!(tuned.source_model.as_deref(), Some("tunedModels/parent"));
    }

    #[test]
    fn absent_sources_stay_absent() {
        let tuned = decode_tuned_model(json!({ "name": "tunedModels/t" })).unwrap();
        assert_eq!(tuned.base_model, None);
        assert_eq!(tuned.source_model, None);
        assert_eq!(tuned.state, TunedModelState::Unspecified);
    }

    #[test]
    fn tuning_task_is_decoded_recursively() {
        let tuned = decode_tuned_model(json!({
            "name": "tunedModels/t",
            "state": "ACTIVE",
            "create_time": "2024-01-01T00:00:00Z",
            "tuning_task": {
                "start_time": "2024-01-01T00:00:00Z",
                "complete_time": "2024-01-01T01:00:00.25Z",
                "hyperparameters": { "epoch_count": 5, "learning_rate": 0.001 },
                "snapshots": [
                    { "step": 1, "epoch": 1, "mean_score": 0.5,
                      "compute_time": "2024-01-01T00:30:00.123Z" },
                    { "step": 2, "epoch": 1, "mean_score": 0.6 },
                ],
            },
        }))
        .unwrap();
        assert_eq!(tuned.state, TunedModelState::Active);
        let task = tuned.tuning_task.unwrap();
        let hype = task.hyperparameters.unwrap();
        assert_eq!(hype.epoch_count, 5);
        assert_eq!(hype.batch_size, 0);
        assert_eq!(task.snapshots.len(), 2);
        assert!(task.snapshots[0].compute_time.is_some());
        assert_eq!(task.snapshots[1].compute_time, None);
    }
}
