//! Decoder for text-generation results.
use super::{DecodeError, Record};
use crate::types::completion::{Completion, TextCompletion};
use serde_json::Value;

/// Decodes a raw text-generation response into a [`Completion`].
///
/// `result` is the first candidate's output, or `None` when the service
/// returned no candidates.
pub fn decode_completion(value: Value) -> Result<Completion, DecodeError> {
    let mut record = Record::new("Completion", value)?;

    let candidates = record
        .take_array("candidates")?
        .into_iter()
        .map(decode_candidate)
        .collect::<Result<Vec<_>, _>>()?;
    let result = candidates.first().map(|c| c.output.clone());

    Ok(Completion {
        candidates,
        result,
        filters: record.take_array("filters")?,
        safety_feedback: record.take_array("safety_feedback")?,
    })
}

fn decode_candidate(value: Value) -> Result<TextCompletion, DecodeError> {
    let mut record = Record::new("TextCompletion", value)?;
    Ok(TextCompletion {
        output: record.string_or_default("output")?,
        safety_ratings: record.take_array("safety_ratings")?,
        citation_metadata: record.take("citation_metadata"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_is_the_first_candidate() {
        let completion = decode_completion(json!({
            "candidates": [
                { "output": "first", "safety_ratings": [] },
                { "output": "second" },
            ],
            "filters": [],
        }))
        .unwrap();
        assert_eq!(completion.result.as_deref(), Some("first"));
        assert_eq!(completion.candidates.len(), 2);
    }

    #[test]
    fn empty_candidates_yield_no_result() {
        let completion = decode_completion(json!({})).unwrap();
        assert_eq!(completion.result, None);
        assert!(completion.candidates.is_empty());
    }
}
