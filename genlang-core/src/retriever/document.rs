//! Document-level operations: chunk CRUD, batch chunk operations, queries.
use super::RetrieverError;
use crate::decode::{decode_chunk, decode_chunk_batch, decode_relevant_chunks};
use crate::name::{qualify, valid_name};
use crate::service::{
    AsyncRetrieverService, BatchCreateChunksRequest, BatchDeleteChunksRequest,
    BatchUpdateChunksRequest, CreateChunkRequest, DeleteChunkRequest, GetChunkRequest,
    ListChunksRequest, QueryDocumentRequest, RetrieverService, UpdateChunkRequest,
    UpdateDocumentRequest,
};
use crate::types::retriever::{
    Chunk, ChunkData, CustomMetadata, Document, MetadataFilter, RelevantChunk,
};
use crate::update::apply_update_paths;
use futures_util::{Stream, StreamExt};
use serde_json::{Map, Value};
use tonic::Status;

/// One element of a batch-create payload: bare text, a named chunk with
/// optional metadata, or a fully built [`Chunk`].
#[derive(Debug, Clone)]
pub enum ChunkSeed {
    Text(String),
    Named {
        name: String,
        data: ChunkData,
        custom_metadata: Vec<CustomMetadata>,
    },
    Chunk(Chunk),
}

impl From<&str> for ChunkSeed {
    fn from(text: &str) -> Self {
        ChunkSeed::Text(text.to_string())
    }
}

impl From<String> for ChunkSeed {
    fn from(text: String) -> Self {
        ChunkSeed::Text(text)
    }
}

impl From<(&str, &str)> for ChunkSeed {
    fn from((name, data): (&str, &str)) -> Self {
        ChunkSeed::Named {
            name: name.to_string(),
            data: data.into(),
            custom_metadata: Vec::new(),
        }
    }
}

impl From<Chunk> for ChunkSeed {
    fn from(chunk: Chunk) -> Self {
        ChunkSeed::Chunk(chunk)
    }
}

impl ChunkSeed {
    fn into_chunk(self) -> Chunk {
        match self {
            ChunkSeed::Text(text) => Chunk {
                data: text.into(),
                ..Chunk::default()
            },
            ChunkSeed::Named {
                name,
                data,
                custom_metadata,
            } => Chunk {
                name,
                data,
                custom_metadata,
                ..Chunk::default()
            },
            ChunkSeed::Chunk(chunk) => chunk,
        }
    }
}

impl Document {
    fn create_chunk_request(
        &self,
        data: ChunkData,
        name: Option<&str>,
        custom_metadata: Vec<CustomMetadata>,
    ) -> Result<CreateChunkRequest, RetrieverError> {
        let chunk_name = match name {
            None => String::new(),
            Some(name) if valid_name(name) => format!("{}/chunks/{name}", self.name),
            Some(name) => {
                return Err(RetrieverError::InvalidName {
                    name: name.to_string(),
                    length: name.len(),
                });
            }
        };
        Ok(CreateChunkRequest {
            parent: self.name.clone(),
            chunk: Chunk {
                name: chunk_name,
                data,
                custom_metadata,
                ..Chunk::default()
            },
        })
    }

    /// Creates a chunk in this document.
    ///
    /// A provided id must pass [`valid_name`] and is qualified under
    /// `{document}/chunks/`; an omitted id is assigned by the service.
    pub fn create_chunk(
        &self,
        service: &mut impl RetrieverService,
        data: impl Into<ChunkData>,
        name: Option<&str>,
        custom_metadata: Vec<CustomMetadata>,
    ) -> Result<Chunk, RetrieverError> {
        let request = self.create_chunk_request(data.into(), name, custom_metadata)?;
        tracing::debug!(parent = %request.parent, name = %request.chunk.name, "create_chunk");
        Ok(decode_chunk(service.create_chunk(request)?)?)
    }

    /// Async form of [`Document::create_chunk`].
    pub async fn create_chunk_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        data: impl Into<ChunkData>,
        name: Option<&str>,
        custom_metadata: Vec<CustomMetadata>,
    ) -> Result<Chunk, RetrieverError> {
        let request = self.create_chunk_request(data.into(), name, custom_metadata)?;
        tracing::debug!(parent = %request.parent, name = %request.chunk.name, "create_chunk");
        Ok(decode_chunk(service.create_chunk(request).await?)?)
    }

    fn batch_create_request(
        &self,
        seeds: impl IntoIterator<Item = ChunkSeed>,
    ) -> BatchCreateChunksRequest {
        let requests = seeds
            .into_iter()
            .enumerate()
            .map(|(i, seed)| {
                let mut chunk = seed.into_chunk();
                // An unnamed element defaults to its position in the batch.
                if chunk.name.is_empty() {
                    chunk.name = i.to_string();
                }
                chunk.name = qualify(&self.name, "chunks", &chunk.name);
                CreateChunkRequest {
                    parent: self.name.clone(),
                    chunk,
                }
            })
            .collect();
        BatchCreateChunksRequest {
            parent: self.name.clone(),
            requests,
        }
    }

    /// Creates several chunks in one request. See [`ChunkSeed`] for the
    /// accepted element shapes.
    pub fn batch_create_chunks(
        &self,
        service: &mut impl RetrieverService,
        seeds: impl IntoIterator<Item = ChunkSeed>,
    ) -> Result<Vec<Chunk>, RetrieverError> {
        let request = self.batch_create_request(seeds);
        tracing::debug!(parent = %request.parent, count = request.requests.len(), "batch_create_chunks");
        Ok(decode_chunk_batch(service.batch_create_chunks(request)?)?)
    }

    /// Async form of [`Document::batch_create_chunks`].
    pub async fn batch_create_chunks_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        seeds: impl IntoIterator<Item = ChunkSeed>,
    ) -> Result<Vec<Chunk>, RetrieverError> {
        let request = self.batch_create_request(seeds);
        tracing::debug!(parent = %request.parent, count = request.requests.len(), "batch_create_chunks");
        Ok(decode_chunk_batch(service.batch_create_chunks(request).await?)?)
    }

    fn get_chunk_request(&self, name: &str) -> GetChunkRequest {
        GetChunkRequest {
            name: qualify(&self.name, "chunks", name),
        }
    }

    /// Fetches a chunk by full name or bare id.
    pub fn get_chunk(
        &self,
        service: &mut impl RetrieverService,
        name: &str,
    ) -> Result<Chunk, RetrieverError> {
        let request = self.get_chunk_request(name);
        tracing::debug!(name = %request.name, "get_chunk");
        Ok(decode_chunk(service.get_chunk(request)?)?)
    }

    /// Async form of [`Document::get_chunk`].
    pub async fn get_chunk_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        name: &str,
    ) -> Result<Chunk, RetrieverError> {
        let request = self.get_chunk_request(name);
        tracing::debug!(name = %request.name, "get_chunk");
        Ok(decode_chunk(service.get_chunk(request).await?)?)
    }

    /// Lists the chunks of this document lazily.
    pub fn list_chunks<S: RetrieverService>(
        &self,
        service: &mut S,
        page_size: Option<i32>,
    ) -> Result<impl Iterator<Item = Result<Chunk, RetrieverError>>, RetrieverError> {
        tracing::debug!(parent = %self.name, ?page_size, "list_chunks");
        let items = service.list_chunks(ListChunksRequest {
            parent: self.name.clone(),
            page_size,
        })?;
        Ok(items.map(decode_chunk_item))
    }

    /// Async form of [`Document::list_chunks`].
    pub async fn list_chunks_async<S: AsyncRetrieverService>(
        &self,
        service: &mut S,
        page_size: Option<i32>,
    ) -> Result<impl Stream<Item = Result<Chunk, RetrieverError>> + Unpin, RetrieverError> {
        tracing::debug!(parent = %self.name, ?page_size, "list_chunks");
        let items = service
            .list_chunks(ListChunksRequest {
                parent: self.name.clone(),
                page_size,
            })
            .await?;
        Ok(items.map(decode_chunk_item))
    }

    fn query_request(
        &self,
        query: &str,
        metadata_filters: Vec<MetadataFilter>,
        results_count: Option<i32>,
    ) -> Result<QueryDocumentRequest, RetrieverError> {
        // Stricter bound than Corpus::query: negative counts are rejected
        // and 100 itself is out of range. The asymmetry is inherited from
        // the service surface and kept as is.
        if let Some(count) = results_count
            && count != 0
            && (count < 0 || count >= 100)
        {
            return Err(RetrieverError::ResultsCountOutOfRange(count));
        }
        Ok(QueryDocumentRequest {
            name: self.name.clone(),
            query: query.to_string(),
            metadata_filters,
            results_count,
        })
    }

    /// Performs a semantic search over the chunks of this document.
    pub fn query(
        &self,
        service: &mut impl RetrieverService,
        query: &str,
        metadata_filters: Vec<MetadataFilter>,
        results_count: Option<i32>,
    ) -> Result<Vec<RelevantChunk>, RetrieverError> {
        let request = self.query_request(query, metadata_filters, results_count)?;
        tracing::debug!(name = %request.name, "query_document");
        Ok(decode_relevant_chunks(service.query_document(request)?)?)
    }

    /// Async form of [`Document::query`].
    pub async fn query_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        query: &str,
        metadata_filters: Vec<MetadataFilter>,
        results_count: Option<i32>,
    ) -> Result<Vec<RelevantChunk>, RetrieverError> {
        let request = self.query_request(query, metadata_filters, results_count)?;
        tracing::debug!(name = %request.name, "query_document");
        Ok(decode_relevant_chunks(service.query_document(request).await?)?)
    }

    /// Applies a partial update to this document (only `display_name` can
    /// be updated) and sends it with the derived field mask.
    pub fn update(
        &mut self,
        service: &mut impl RetrieverService,
        updates: Map<String, Value>,
    ) -> Result<(), RetrieverError> {
        let update_mask = apply_update_paths(self, updates)?;
        let request = UpdateDocumentRequest {
            document: self.clone(),
            update_mask,
        };
        tracing::debug!(name = %request.document.name, mask = ?request.update_mask, "update_document");
        service.update_document(request)?;
        Ok(())
    }

    /// Async form of [`Document::update`].
    pub async fn update_async(
        &mut self,
        service: &mut impl AsyncRetrieverService,
        updates: Map<String, Value>,
    ) -> Result<(), RetrieverError> {
        let update_mask = apply_update_paths(self, updates)?;
        let request = UpdateDocumentRequest {
            document: self.clone(),
            update_mask,
        };
        tracing::debug!(name = %request.document.name, mask = ?request.update_mask, "update_document");
        service.update_document(request).await?;
        Ok(())
    }

    /// Updates several chunks in one request.
    ///
    /// Each entry pairs a chunk name (bare ids are qualified) with an
    /// update payload in the [`crate::update`] format. The current chunk is
    /// fetched, the payload validated and applied, and one update request
    /// built per entry.
    pub fn batch_update_chunks(
        &self,
        service: &mut impl RetrieverService,
        updates: impl IntoIterator<Item = (String, Map<String, Value>)>,
    ) -> Result<Vec<Chunk>, RetrieverError> {
        let mut requests = Vec::new();
        for (name, payload) in updates {
            let mut chunk = self.get_chunk(service, &name)?;
            let update_mask = apply_update_paths(&mut chunk, payload)?;
            requests.push(UpdateChunkRequest { chunk, update_mask });
        }
        let request = BatchUpdateChunksRequest {
            parent: self.name.clone(),
            requests,
        };
        tracing::debug!(parent = %request.parent, count = request.requests.len(), "batch_update_chunks");
        Ok(decode_chunk_batch(service.batch_update_chunks(request)?)?)
    }

    /// Async form of [`Document::batch_update_chunks`].
    pub async fn batch_update_chunks_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        updates: impl IntoIterator<Item = (String, Map<String, Value>)>,
    ) -> Result<Vec<Chunk>, RetrieverError> {
        let mut requests = Vec::new();
        for (name, payload) in updates {
            let mut chunk = self.get_chunk_async(service, &name).await?;
            let update_mask = apply_update_paths(&mut chunk, payload)?;
            requests.push(UpdateChunkRequest { chunk, update_mask });
        }
        let request = BatchUpdateChunksRequest {
            parent: self.name.clone(),
            requests,
        };
        tracing::debug!(parent = %request.parent, count = request.requests.len(), "batch_update_chunks");
        Ok(decode_chunk_batch(service.batch_update_chunks(request).await?)?)
    }

    fn delete_chunk_request(&self, name: &str) -> DeleteChunkRequest {
        DeleteChunkRequest {
            name: qualify(&self.name, "chunks", name),
        }
    }

    /// Deletes a chunk by full name or bare id.
    pub fn delete_chunk(
        &self,
        service: &mut impl RetrieverService,
        name: &str,
    ) -> Result<(), RetrieverError> {
        let request = self.delete_chunk_request(name);
        tracing::debug!(name = %request.name, "delete_chunk");
        Ok(service.delete_chunk(request)?)
    }

    /// Async form of [`Document::delete_chunk`].
    pub async fn delete_chunk_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        name: &str,
    ) -> Result<(), RetrieverError> {
        let request = self.delete_chunk_request(name);
        tracing::debug!(name = %request.name, "delete_chunk");
        Ok(service.delete_chunk(request).await?)
    }

    fn batch_delete_request<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> BatchDeleteChunksRequest {
        BatchDeleteChunksRequest {
            parent: self.name.clone(),
            requests: names
                .into_iter()
                .map(|name| self.delete_chunk_request(name))
                .collect(),
        }
    }

    /// Deletes several chunks in one request.
    pub fn batch_delete_chunks<'a>(
        &self,
        service: &mut impl RetrieverService,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), RetrieverError> {
        let request = self.batch_delete_request(names);
        tracing::debug!(parent = %request.parent, count = request.requests.len(), "batch_delete_chunks");
        Ok(service.batch_delete_chunks(request)?)
    }

    /// Async form of [`Document::batch_delete_chunks`].
    pub async fn batch_delete_chunks_async<'a>(
        &self,
        service: &mut impl AsyncRetrieverService,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), RetrieverError> {
        let request = self.batch_delete_request(names);
        tracing::debug!(parent = %request.parent, count = request.requests.len(), "batch_delete_chunks");
        Ok(service.batch_delete_chunks(request).await?)
    }
}

fn decode_chunk_item(item: Result<Value, Status>) -> Result<Chunk, RetrieverError> {
    Ok(decode_chunk(item?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        Document {
            name: "corpora/c1/documents/d1".to_string(),
            ..Document::default()
        }
    }

    #[test]
    fn chunk_ids_are_validated_and_qualified() {
        let request = document()
            .create_chunk_request("hello".into(), Some("k1"), Vec::new())
            .unwrap();
        assert_eq!(request.chunk.name, "corpora/c1/documents/d1/chunks/k1");
        assert_eq!(request.chunk.data.string_value, "hello");

        let err = document()
            .create_chunk_request("hello".into(), Some("UPPER"), Vec::new())
            .unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidName { .. }));
    }

    #[test]
    fn batch_seeds_default_to_their_index() {
        let request = document().batch_create_request(vec![
            ChunkSeed::from("plain text"),
            ChunkSeed::from(("named", "more text")),
        ]);
        assert_eq!(
            request.requests[0].chunk.name,
            "corpora/c1/documents/d1/chunks/0"
        );
        assert_eq!(
            request.requests[1].chunk.name,
            "corpora/c1/documents/d1/chunks/named"
        );
        assert_eq!(request.requests[1].chunk.data.string_value, "more text");
    }

    #[test]
    fn query_rejects_out_of_range_results_counts() {
        let d = document();
        assert!(matches!(
            d.query_request("q", Vec::new(), Some(-1)),
            Err(RetrieverError::ResultsCountOutOfRange(-1))
        ));
        assert!(matches!(
            d.query_request("q", Vec::new(), Some(100)),
            Err(RetrieverError::ResultsCountOutOfRange(100))
        ));
        assert!(d.query_request("q", Vec::new(), Some(99)).is_ok());
        assert!(d.query_request("q", Vec::new(), None).is_ok());
    }

    #[test]
    fn batch_delete_qualifies_bare_ids() {
        let request = document().batch_delete_request(["k1", "corpora/c1/documents/d1/chunks/k2"]);
        assert_eq!(request.requests[0].name, "corpora/c1/documents/d1/chunks/k1");
        assert_eq!(request.requests[1].name, "corpora/c1/documents/d1/chunks/k2");
    }
}
