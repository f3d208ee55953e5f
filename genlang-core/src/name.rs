//! # Resource Name Validation
//!
//! Remote entities are addressed by hierarchical string names
//! (`corpora/c1/documents/d1`, `tunedModels/my-model`). The id segments the
//! caller controls must match fixed patterns; this module validates them and
//! normalizes the model-name forms accepted across the API.
//!
//! Validation failures always carry the offending name and its length. Names
//! are never truncated or sanitized silently, with one documented exception:
//! bare corpus ids have ASCII punctuation (other than `-`) stripped before
//! the `corpora/` prefix is attached, mirroring the platform's behavior.
use crate::types::model::{Model, TunedModel};

/// Errors produced while validating or normalizing resource names.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    #[error(
        "the id must consist of lowercase alphanumeric characters (or -) and be 40 or fewer characters; got '{name}' (length {length})"
    )]
    InvalidId { name: String, length: usize },
    #[error(
        "the name must consist of lowercase alphanumeric characters (or -) and be at most 63 characters; got '{name}' (length {length})"
    )]
    InvalidTunedModelName { name: String, length: usize },
    #[error("model names should start with `models/` or `tunedModels/`, got: '{0}'")]
    BadModelPrefix(String),
    #[error("corpus name must be formatted as corpora/<id>, got '{0}'")]
    MalformedCorpusName(String),
}

/// Checks a retriever id segment (corpus/document/chunk id).
///
/// The segment must start and end with a lowercase alphanumeric character,
/// may contain dashes in between, and must be shorter than 40 characters.
/// Note the pattern requires at least two characters.
pub fn valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() < 2 || bytes.len() >= 40 {
        return false;
    }
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    alnum(bytes[0])
        && alnum(bytes[bytes.len() - 1])
        && bytes[1..bytes.len() - 1]
            .iter()
            .all(|&b| alnum(b) || b == b'-')
}

/// Checks a tuned-model id: a lowercase letter followed by up to 62
/// lowercase-alphanumeric-or-dash characters, ending alphanumeric.
pub fn valid_tuned_model_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let Some((&first, rest)) = bytes.split_first() else {
        return false;
    };
    if bytes.len() > 63 || !first.is_ascii_lowercase() {
        return false;
    }
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    match rest.split_last() {
        None => true,
        Some((&last, middle)) => alnum(last) && middle.iter().all(|&b| alnum(b) || b == b'-'),
    }
}

/// The forms a model name may be given in: a raw string or an entity whose
/// `name` field is used.
#[derive(Debug, Clone, Copy)]
pub enum ModelNameOptions<'a> {
    Name(&'a str),
    Model(&'a Model),
    TunedModel(&'a TunedModel),
}

impl<'a> From<&'a str> for ModelNameOptions<'a> {
    fn from(name: &'a str) -> Self {
        ModelNameOptions::Name(name)
    }
}

impl<'a> From<&'a Model> for ModelNameOptions<'a> {
    fn from(model: &'a Model) -> Self {
        ModelNameOptions::Model(model)
    }
}

impl<'a> From<&'a TunedModel> for ModelNameOptions<'a> {
    fn from(model: &'a TunedModel) -> Self {
        ModelNameOptions::TunedModel(model)
    }
}

/// Resolves any accepted model-name form to the fully qualified name.
///
/// The result always starts with `models/` or `tunedModels/`.
pub fn make_model_name<'a>(name: impl Into<ModelNameOptions<'a>>) -> Result<String, NameError> {
    let name = match name.into() {
        ModelNameOptions::Name(name) => name,
        ModelNameOptions::Model(model) => model.name.as_str(),
        ModelNameOptions::TunedModel(model) => model.name.as_deref().unwrap_or(""),
    };
    if name.starts_with("models/") || name.starts_with("tunedModels/") {
        Ok(name.to_string())
    } else {
        Err(NameError::BadModelPrefix(name.to_string()))
    }
}

/// Normalizes a caller-supplied corpus name to the `corpora/<id>` form.
///
/// An already-qualified name passes through. A bare id has ASCII punctuation
/// other than `-` stripped before the prefix is attached. A name that embeds
/// `corpora/` anywhere but the front is malformed.
pub fn make_corpus_name(name: &str) -> Result<String, NameError> {
    if let Some(rest) = name.strip_prefix("corpora/") {
        if !rest.is_empty() && !rest.starts_with('/') {
            return Ok(name.to_string());
        }
        return Err(NameError::MalformedCorpusName(name.to_string()));
    }
    if name.contains("corpora/") {
        return Err(NameError::MalformedCorpusName(name.to_string()));
    }
    let id: String = name
        .chars()
        .filter(|&c| !(c.is_ascii_punctuation() && c != '-'))
        .collect();
    Ok(format!("corpora/{id}"))
}

/// Qualifies a bare child id under its parent, leaving full names untouched.
pub(crate) fn qualify(parent: &str, collection: &str, name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{parent}/{collection}/{name}")
    }
}
