//! # Resource Façades
//!
//! High-level operations over corpora, documents and chunks. Each operation
//! validates and builds a request, hands it to an injected service client
//! ([`crate::service`]), and decodes the raw response into canonical types.
//! Every operation exists in a blocking form and an `_async` twin; both
//! share the same request builders and produce identical decoded results
//! for identical service responses.
//!
//! Corpus-level entry points are free functions here; document- and
//! chunk-level operations hang off the entity they act on
//! ([`Corpus`](crate::types::retriever::Corpus),
//! [`Document`](crate::types::retriever::Document),
//! [`Chunk`](crate::types::retriever::Chunk)).
mod chunk;
mod corpus;
mod document;

pub use document::ChunkSeed;

use crate::decode::{DecodeError, decode_corpus};
use crate::name::{NameError, make_corpus_name};
use crate::service::{
    AsyncRetrieverService, CreateCorpusRequest, DeleteCorpusRequest, GetCorpusRequest,
    ListCorporaRequest, RetrieverService,
};
use crate::types::retriever::Corpus;
use crate::update::UpdateError;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tonic::Status;

/// Errors surfaced by the resource façades.
///
/// Validation failures are produced before any request is sent; a
/// [`RetrieverError::Rpc`] is the remote service's verdict, passed through
/// unmodified.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error(
        "the id must consist of lowercase alphanumeric characters (or -) and be 40 or fewer characters; got '{name}' (length {length})"
    )]
    InvalidName { name: String, length: usize },
    #[error("either the corpus name or display name must be specified")]
    MissingIdentifier,
    #[error("number of results returned must be between 1 and 100, got {0}")]
    ResultsCountOutOfRange(i32),
    #[error("cannot limit access for '{0}' when the grantee type is EVERYONE")]
    EmailForEveryone(String),
    #[error("an email address must be specified unless the grantee type is EVERYONE")]
    MissingEmailAddress,
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Rpc(#[from] Status),
}

fn create_corpus_request(
    name: Option<&str>,
    display_name: Option<&str>,
) -> Result<CreateCorpusRequest, RetrieverError> {
    if name.is_none() && display_name.is_none() {
        return Err(RetrieverError::MissingIdentifier);
    }
    let corpus = Corpus {
        name: match name {
            Some(name) => make_corpus_name(name)?,
            None => String::new(),
        },
        display_name: display_name.unwrap_or_default().to_string(),
        ..Corpus::default()
    };
    Ok(CreateCorpusRequest { corpus })
}

/// Creates a corpus from a name, a display name, or both.
///
/// A bare id is normalized with [`make_corpus_name`]; an omitted name is
/// assigned by the service.
pub fn create_corpus(
    service: &mut impl RetrieverService,
    name: Option<&str>,
    display_name: Option<&str>,
) -> Result<Corpus, RetrieverError> {
    let request = create_corpus_request(name, display_name)?;
    tracing::debug!(name = %request.corpus.name, "create_corpus");
    Ok(decode_corpus(service.create_corpus(request)?)?)
}

/// Async form of [`create_corpus`].
pub async fn create_corpus_async(
    service: &mut impl AsyncRetrieverService,
    name: Option<&str>,
    display_name: Option<&str>,
) -> Result<Corpus, RetrieverError> {
    let request = create_corpus_request(name, display_name)?;
    tracing::debug!(name = %request.corpus.name, "create_corpus");
    Ok(decode_corpus(service.create_corpus(request).await?)?)
}

fn get_corpus_request(name: &str) -> Result<GetCorpusRequest, RetrieverError> {
    Ok(GetCorpusRequest {
        name: make_corpus_name(name)?,
    })
}

/// Fetches a corpus by name or bare id.
pub fn get_corpus(
    service: &mut impl RetrieverService,
    name: &str,
) -> Result<Corpus, RetrieverError> {
    let request = get_corpus_request(name)?;
    tracing::debug!(name = %request.name, "get_corpus");
    Ok(decode_corpus(service.get_corpus(request)?)?)
}

/// Async form of [`get_corpus`].
pub async fn get_corpus_async(
    service: &mut impl AsyncRetrieverService,
    name: &str,
) -> Result<Corpus, RetrieverError> {
    let request = get_corpus_request(name)?;
    tracing::debug!(name = %request.name, "get_corpus");
    Ok(decode_corpus(service.get_corpus(request).await?)?)
}

fn delete_corpus_request(name: &str, force: bool) -> Result<DeleteCorpusRequest, RetrieverError> {
    Ok(DeleteCorpusRequest {
        name: make_corpus_name(name)?,
        force,
    })
}

/// Deletes a corpus. `force` also deletes any documents it contains.
pub fn delete_corpus(
    service: &mut impl RetrieverService,
    name: &str,
    force: bool,
) -> Result<(), RetrieverError> {
    let request = delete_corpus_request(name, force)?;
    tracing::debug!(name = %request.name, force, "delete_corpus");
    Ok(service.delete_corpus(request)?)
}

/// Async form of [`delete_corpus`].
pub async fn delete_corpus_async(
    service: &mut impl AsyncRetrieverService,
    name: &str,
    force: bool,
) -> Result<(), RetrieverError> {
    let request = delete_corpus_request(name, force)?;
    tracing::debug!(name = %request.name, force, "delete_corpus");
    Ok(service.delete_corpus(request).await?)
}

/// Lists corpora lazily: one decode per yielded item.
pub fn list_corpora<S: RetrieverService>(
    service: &mut S,
    page_size: Option<i32>,
) -> Result<impl Iterator<Item = Result<Corpus, RetrieverError>>, RetrieverError> {
    tracing::debug!(?page_size, "list_corpora");
    let items = service.list_corpora(ListCorporaRequest { page_size })?;
    Ok(items.map(decode_corpus_item))
}

/// Async form of [`list_corpora`].
pub async fn list_corpora_async<S: AsyncRetrieverService>(
    service: &mut S,
    page_size: Option<i32>,
) -> Result<impl Stream<Item = Result<Corpus, RetrieverError>> + Unpin, RetrieverError> {
    tracing::debug!(?page_size, "list_corpora");
    let items = service.list_corpora(ListCorporaRequest { page_size }).await?;
    Ok(items.map(decode_corpus_item))
}

fn decode_corpus_item(item: Result<Value, Status>) -> Result<Corpus, RetrieverError> {
    Ok(decode_corpus(item?)?)
}
