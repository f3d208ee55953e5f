//! # Tuning Data Normalization
//!
//! Training data for model tuning arrives in many shapes: an
//! already-canonical dataset, a URL (possibly a Google Sheets link), a local
//! file path, a column mapping, or a plain sequence of examples. All of them
//! converge on one canonical [`Dataset`].
//!
//! The accepted shapes are the explicit [`TuningSource`] sum type; the only
//! runtime disambiguation is [`TuningSource::from_text`], which splits URLs
//! from filesystem paths. Network and file I/O are delegated to a
//! [`TuningDataLoader`]; this module owns the branching and normalization
//! only.
use crate::BoxError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use url::Url;

/// One training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningExample {
    pub text_input: String,
    pub output: String,
}

/// The canonical training dataset: an ordered sequence of examples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub examples: Vec<TuningExample>,
}

/// One element of a sequence-shaped tuning source.
#[derive(Debug, Clone)]
pub enum ExampleSource {
    /// Already canonical.
    Example(TuningExample),
    /// Positional `(input, output)` pair.
    Pair(String, String),
    /// A record indexed by the caller's input/output keys.
    Record(Map<String, Value>),
}

/// The accepted tuning-data shapes. Branch order encodes precedence.
#[derive(Debug, Clone)]
pub enum TuningSource {
    Dataset(Dataset),
    Url(Url),
    Path(PathBuf),
    /// Column-major data: key -> sequence of cell values.
    Columns(Map<String, Value>),
    Examples(Vec<ExampleSource>),
}

impl TuningSource {
    /// Disambiguates a string source: `scheme://...` (without whitespace)
    /// is a URL, anything else a filesystem path.
    pub fn from_text(text: &str) -> Result<TuningSource, TuningDataError> {
        if is_url(text) {
            let url = Url::parse(text)
                .map_err(|source| TuningDataError::InvalidUrl(text.to_string(), source))?;
            Ok(TuningSource::Url(url))
        } else {
            Ok(TuningSource::Path(PathBuf::from(text)))
        }
    }
}

fn is_url(text: &str) -> bool {
    match text.split_once("://") {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !rest.is_empty()
                && !text.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Errors produced while normalizing tuning data.
#[derive(Debug, thiserror::Error)]
pub enum TuningDataError {
    #[error("incomplete Google Sheets URL: '{0}'")]
    IncompleteSheetUrl(String),
    #[error("invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("failed to load tuning data from '{location}': {source}")]
    Load {
        location: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to parse tuning data as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse tuning data as CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("{role} is '{key}', but data has keys: {available:?}")]
    MissingColumn {
        role: &'static str,
        key: String,
        available: Vec<String>,
    },
    #[error("column '{key}' must be a sequence, got: {value}")]
    NotAColumn { key: String, value: String },
    #[error("example pairs must have exactly 2 elements, got {len}: {value}")]
    BadPair { len: usize, value: String },
    #[error("could not convert value into a tuning example: {0}")]
    InvalidExample(String),
}

/// The I/O seam of the encoder: fetches URLs and reads files as text.
pub trait TuningDataLoader {
    fn fetch(&self, url: &Url) -> Result<String, BoxError>;
    fn read(&self, path: &Path) -> Result<String, BoxError>;
}

/// A loader over the local filesystem. URL sources are refused; callers
/// that need HTTP supply their own loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl TuningDataLoader for FsLoader {
    fn fetch(&self, url: &Url) -> Result<String, BoxError> {
        Err(format!("FsLoader cannot fetch '{url}'; supply an HTTP-capable loader").into())
    }

    fn read(&self, path: &Path) -> Result<String, BoxError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Normalizes any accepted tuning-data shape into a [`Dataset`].
///
/// `input_key`/`output_key` select the columns of mapping- and
/// record-shaped sources (the platform defaults are `text_input` and
/// `output`).
pub fn encode_tuning_data(
    source: TuningSource,
    loader: &impl TuningDataLoader,
    input_key: &str,
    output_key: &str,
) -> Result<Dataset, TuningDataError> {
    match source {
        TuningSource::Dataset(dataset) => Ok(dataset),
        TuningSource::Url(url) => {
            let url = normalize_sheet_url(&url)?;
            let content = loader.fetch(&url).map_err(|source| TuningDataError::Load {
                location: url.to_string(),
                source,
            })?;
            parse_content(&content, url.path(), input_key, output_key)
        }
        TuningSource::Path(path) => {
            let content = loader.read(&path).map_err(|source| TuningDataError::Load {
                location: path.display().to_string(),
                source,
            })?;
            let location = path.to_string_lossy().into_owned();
            parse_content(&content, &location, input_key, output_key)
        }
        TuningSource::Columns(columns) => convert_columns(columns, input_key, output_key),
        TuningSource::Examples(examples) => convert_examples(examples, input_key, output_key),
    }
}

/// Rewrites a Google Sheets URL to its CSV-export form, preserving a
/// `gid=<digits>` tab parameter found anywhere in the URL. Non-sheets URLs
/// pass through untouched.
pub fn normalize_sheet_url(url: &Url) -> Result<Url, TuningDataError> {
    if url.host_str() != Some("docs.google.com") || !url.path().starts_with("/spreadsheets") {
        return Ok(url.clone());
    }
    let id = url
        .path()
        .strip_prefix("/spreadsheets/d/")
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TuningDataError::IncompleteSheetUrl(url.to_string()))?;

    let export = match find_gid(url.as_str()) {
        Some(gid) => {
            format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv&gid={gid}")
        }
        None => format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv"),
    };
    Url::parse(&export).map_err(|source| TuningDataError::InvalidUrl(export, source))
}

fn find_gid(url: &str) -> Option<&str> {
    let start = url.find("gid=")? + "gid=".len();
    let digits = url[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    (!digits.is_empty()).then_some(digits)
}

fn parse_content(
    content: &str,
    location: &str,
    input_key: &str,
    output_key: &str,
) -> Result<Dataset, TuningDataError> {
    if location.to_lowercase().ends_with(".json") {
        let value: Value = serde_json::from_str(content)?;
        match value {
            Value::Object(columns) => convert_columns(columns, input_key, output_key),
            Value::Array(items) => {
                let examples = items
                    .into_iter()
                    .map(value_to_example_source)
                    .collect::<Result<Vec<_>, _>>()?;
                convert_examples(examples, input_key, output_key)
            }
            other => Err(TuningDataError::InvalidExample(other.to_string())),
        }
    } else {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();
        let mut examples = Vec::new();
        for row in reader.records() {
            let row = row?;
            let record: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
                .collect();
            examples.push(record_to_example(&record, input_key, output_key)?);
        }
        Ok(Dataset { examples })
    }
}

fn value_to_example_source(value: Value) -> Result<ExampleSource, TuningDataError> {
    match value {
        Value::Object(record) => Ok(ExampleSource::Record(record)),
        Value::Array(items) => {
            if items.len() != 2 {
                return Err(TuningDataError::BadPair {
                    len: items.len(),
                    value: Value::Array(items).to_string(),
                });
            }
            let mut items = items.into_iter();
            let input = value_to_text(items.next().unwrap_or(Value::Null))?;
            let output = value_to_text(items.next().unwrap_or(Value::Null))?;
            Ok(ExampleSource::Pair(input, output))
        }
        other => Err(TuningDataError::InvalidExample(other.to_string())),
    }
}

fn convert_columns(
    columns: Map<String, Value>,
    input_key: &str,
    output_key: &str,
) -> Result<Dataset, TuningDataError> {
    let inputs = take_column(&columns, input_key, "input_key")?;
    let outputs = take_column(&columns, output_key, "output_key")?;

    // Positional zip, truncating to the shorter column.
    let examples = inputs
        .iter()
        .zip(outputs.iter())
        .map(|(input, output)| {
            Ok(TuningExample {
                text_input: value_to_text(input.clone())?,
                output: value_to_text(output.clone())?,
            })
        })
        .collect::<Result<Vec<_>, TuningDataError>>()?;
    Ok(Dataset { examples })
}

fn take_column<'a>(
    columns: &'a Map<String, Value>,
    key: &str,
    role: &'static str,
) -> Result<&'a Vec<Value>, TuningDataError> {
    let value = columns.get(key).ok_or_else(|| {
        let mut available: Vec<String> = columns.keys().cloned().collect();
        available.sort();
        TuningDataError::MissingColumn {
            role,
            key: key.to_string(),
            available,
        }
    })?;
    match value {
        Value::Array(items) => Ok(items),
        other => Err(TuningDataError::NotAColumn {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

fn convert_examples(
    examples: Vec<ExampleSource>,
    input_key: &str,
    output_key: &str,
) -> Result<Dataset, TuningDataError> {
    let examples = examples
        .into_iter()
        .map(|example| match example {
            ExampleSource::Example(example) => Ok(example),
            ExampleSource::Pair(text_input, output) => Ok(TuningExample { text_input, output }),
            ExampleSource::Record(record) => record_to_example(&record, input_key, output_key),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Dataset { examples })
}

fn record_to_example(
    record: &Map<String, Value>,
    input_key: &str,
    output_key: &str,
) -> Result<TuningExample, TuningDataError> {
    let field = |key: &str, role: &'static str| {
        record.get(key).cloned().ok_or_else(|| {
            let mut available: Vec<String> = record.keys().cloned().collect();
            available.sort();
            TuningDataError::MissingColumn {
                role,
                key: key.to_string(),
                available,
            }
        })
    };
    Ok(TuningExample {
        text_input: value_to_text(field(input_key, "input_key")?)?,
        output: value_to_text(field(output_key, "output_key")?)?,
    })
}

fn value_to_text(value: Value) -> Result<String, TuningDataError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(TuningDataError::InvalidExample(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticLoader(&'static str);

    impl TuningDataLoader for StaticLoader {
        fn fetch(&self, _url: &Url) -> Result<String, BoxError> {
            Ok(self.0.to_string())
        }

        fn read(&self, _path: &Path) -> Result<String, BoxError> {
            Ok(self.0.to_string())
        }
    }

    fn columns(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test payloads are objects"),
        }
    }

    fn pairs(dataset: &Dataset) -> Vec<(&str, &str)> {
        dataset
            .examples
            .iter()
            .map(|e| (e.text_input.as_str(), e.output.as_str()))
            .collect()
    }

    #[test]
    fn column_mapping_zips_positionally() {
        let source = TuningSource::Columns(columns(json!({
            "text_input": ["a", "b"],
            "output": ["x", "y"],
        })));
        let dataset = encode_tuning_data(source, &FsLoader, "text_input", "output").unwrap();
        assert_eq!(pairs(&dataset), [("a", "x"), ("b", "y")]);
    }

    #[test]
    fn column_zip_truncates_to_the_shorter() {
        let source = TuningSource::Columns(columns(json!({
            "text_input": ["a", "b", "c"],
            "output": ["x"],
        })));
        let dataset = encode_tuning_data(source, &FsLoader, "text_input", "output").unwrap();
        assert_eq!(pairs(&dataset), [("a", "x")]);
    }

    #[test]
    fn missing_column_lists_available_keys() {
        let source = TuningSource::Columns(columns(json!({ "prompt": ["a"], "output": ["x"] })));
        let err = encode_tuning_data(source, &FsLoader, "text_input", "output").unwrap_err();
        match err {
            TuningDataError::MissingColumn { role, key, available } => {
                assert_eq!(role, "input_key");
                assert_eq!(key, "text_input");
                assert_eq!(available, ["output", "prompt"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn example_sequences_accept_all_shapes() {
        let source = TuningSource::Examples(vec![
            ExampleSource::Example(TuningExample {
                text_input: "a".to_string(),
                output: "x".to_string(),
            }),
            ExampleSource::Pair("b".to_string(), "y".to_string()),
            ExampleSource::Record(columns(json!({ "text_input": "c", "output": "z" }))),
        ]);
        let dataset = encode_tuning_data(source, &FsLoader, "text_input", "output").unwrap();
        assert_eq!(pairs(&dataset), [("a", "x"), ("b", "y"), ("c", "z")]);
    }

    #[test]
    fn sheet_urls_are_rewritten_to_csv_export() {
        let url = Url::parse("https://docs.google.com/spreadsheets/d/ID/edit#gid=42").unwrap();
        assert_eq!(
            normalize_sheet_url(&url).unwrap().as_str(),
            "https://docs.google.com/spreadsheets/d/ID/export?format=csv&gid=42"
        );

        let no_tab = Url::parse("https://docs.google.com/spreadsheets/d/ID/edit").unwrap();
        assert_eq!(
            normalize_sheet_url(&no_tab).unwrap().as_str(),
            "https://docs.google.com/spreadsheets/d/ID/export?format=csv"
        );

        let incomplete = Url::parse("https://docs.google.com/spreadsheets/").unwrap();
        assert!(matches!(
            normalize_sheet_url(&incomplete),
            Err(TuningDataError::IncompleteSheetUrl(_))
        ));

        let other = Url::parse("https://example.com/data.csv").unwrap();
        assert_eq!(normalize_sheet_url(&other).unwrap(), other);
    }

    #[test]
    fn text_sources_split_urls_from_paths() {
        assert!(matches!(
            TuningSource::from_text("https://example.com/data.csv").unwrap(),
            TuningSource::Url(_)
        ));
        assert!(matches!(
            TuningSource::from_text("data/train.csv").unwrap(),
            TuningSource::Path(_)
        ));
        assert!(matches!(
            TuningSource::from_text("not a url://x").unwrap(),
            TuningSource::Path(_)
        ));
    }

    #[test]
    fn csv_content_is_parsed_by_header() {
        let loader = StaticLoader("text_input,output\na,x\nb,y\n");
        let source = TuningSource::Path(PathBuf::from("train.csv"));
        let dataset = encode_tuning_data(source, &loader, "text_input", "output").unwrap();
        assert_eq!(pairs(&dataset), [("a", "x"), ("b", "y")]);
    }

    #[test]
    fn json_extension_selects_json_parsing() {
        let loader = StaticLoader(r#"[{"text_input": "a", "output": "x"}, ["b", "y"]]"#);
        let source = TuningSource::Path(PathBuf::from("train.JSON"));
        let dataset = encode_tuning_data(source, &loader, "text_input", "output").unwrap();
        assert_eq!(pairs(&dataset), [("a", "x"), ("b", "y")]);
    }

    #[test]
    fn numeric_cells_stringify() {
        let source = TuningSource::Columns(columns(json!({
            "text_input": [1, 2],
            "output": ["x", "y"],
        })));
        let dataset = encode_tuning_data(source, &FsLoader, "text_input", "output").unwrap();
        assert_eq!(pairs(&dataset), [("1", "x"), ("2", "y")]);
    }
}
