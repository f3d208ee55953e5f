//! # In-Memory Retriever Service
//!
//! A self-contained implementation of the `genlang-core` service traits,
//! backed by maps keyed on resource name. It exists so the core crate's
//! integration tests can exercise the full request/decode round trip
//! without a network: responses are raw wire records with RFC 3339
//! timestamps of varying fractional precision, exactly the shapes the
//! decoders must accept.
//!
//! Fidelity notes: `page_size` is accepted but listings always return the
//! full result set in one pass, and queries return every chunk in scope
//! with a fixed relevance score. Pagination and ranking are the real
//! service's business.
use chrono::{Duration, TimeZone, Utc};
use genlang_core::service::{
    AsyncPermissionService, AsyncRetrieverService, BatchCreateChunksRequest,
    BatchDeleteChunksRequest, BatchUpdateChunksRequest, CreateChunkRequest, CreateCorpusRequest,
    CreateDocumentRequest, CreatePermissionRequest, DeleteChunkRequest, DeleteCorpusRequest,
    DeleteDocumentRequest, GetChunkRequest, GetCorpusRequest, GetDocumentRequest,
    ListChunksRequest, ListCorporaRequest, ListDocumentsRequest, ListPermissionsRequest,
    PermissionService, QueryCorpusRequest, QueryDocumentRequest, RetrieverService,
    UpdateChunkRequest, UpdateCorpusRequest, UpdateDocumentRequest,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tonic::Status;

/// Relevance score attached to every query result.
pub const FIXED_RELEVANCE: f64 = 0.5;

/// The in-memory store. Entities are kept as wire records.
#[derive(Debug, Default)]
pub struct MemoryRetriever {
    corpora: BTreeMap<String, Map<String, Value>>,
    documents: BTreeMap<String, Map<String, Value>>,
    chunks: BTreeMap<String, Map<String, Value>>,
    permissions: BTreeMap<String, Map<String, Value>>,
    seq: u64,
}

type Items = std::vec::IntoIter<Result<Value, Status>>;

impl MemoryRetriever {
    pub fn new() -> Self {
        MemoryRetriever::default()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Monotonic timestamps whose fractional precision cycles, so the
    /// decoders see every accepted wire form.
    fn timestamp(&mut self) -> String {
        let tick = self.next_seq() as i64;
        let base = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();
        let time = (base + Duration::seconds(tick)).format("%Y-%m-%dT%H:%M:%S");
        match tick % 3 {
            0 => format!("{time}Z"),
            1 => format!("{time}.5Z"),
            _ => format!("{time}.123456Z"),
        }
    }

    fn store_entity<T: Serialize>(entity: &T) -> Map<String, Value> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn stamp_created(&mut self, record: &mut Map<String, Value>) {
        let now = self.timestamp();
        record.insert("create_time".to_string(), Value::String(now.clone()));
        record.insert("update_time".to_string(), Value::String(now));
    }

    fn children<'a>(
        collection: &'a BTreeMap<String, Map<String, Value>>,
        parent: &str,
    ) -> impl Iterator<Item = &'a Map<String, Value>> {
        let prefix = format!("{parent}/");
        collection
            .range(prefix.clone()..)
            .take_while(move |(name, _)| name.starts_with(&prefix))
            .map(|(_, record)| record)
    }

    fn listing(records: Vec<Value>) -> Items {
        records
            .into_iter()
            .map(Ok)
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn chunks_under(&self, scope: &str, results_count: Option<i32>) -> Value {
        let mut relevant: Vec<Value> = Self::children(&self.chunks, scope)
            .map(|chunk| {
                json!({
                    "chunk_relevance_score": FIXED_RELEVANCE,
                    "chunk": Value::Object(chunk.clone()),
                })
            })
            .collect();
        if let Some(count) = results_count
            && count > 0
        {
            relevant.truncate(count as usize);
        }
        json!({ "relevant_chunks": relevant })
    }

    fn do_create_corpus(&mut self, request: CreateCorpusRequest) -> Result<Value, Status> {
        let mut record = Self::store_entity(&request.corpus);
        let name = match request.corpus.name.as_str() {
            "" => format!("corpora/corpus-{}", self.next_seq()),
            name => name.to_string(),
        };
        if self.corpora.contains_key(&name) {
            return Err(Status::already_exists(format!("corpus '{name}' exists")));
        }
        record.insert("name".to_string(), Value::String(name.clone()));
        self.stamp_created(&mut record);
        self.corpora.insert(name, record.clone());
        Ok(Value::Object(record))
    }

    fn do_get_corpus(&self, request: GetCorpusRequest) -> Result<Value, Status> {
        self.corpora
            .get(&request.name)
            .map(|record| Value::Object(record.clone()))
            .ok_or_else(|| Status::not_found(format!("corpus '{}' not found", request.name)))
    }

    fn do_update_corpus(&mut self, request: UpdateCorpusRequest) -> Result<Value, Status> {
        let now = self.timestamp();
        let name = request.corpus.name.clone();
        let patch = Self::store_entity(&request.corpus);
        let record = self
            .corpora
            .get_mut(&name)
            .ok_or_else(|| Status::not_found(format!("corpus '{name}' not found")))?;
        apply_mask(record, &patch, &request.update_mask)?;
        record.insert("update_time".to_string(), Value::String(now));
        Ok(Value::Object(record.clone()))
    }

    fn do_delete_corpus(&mut self, request: DeleteCorpusRequest) -> Result<(), Status> {
        if !self.corpora.contains_key(&request.name) {
            return Err(Status::not_found(format!(
                "corpus '{}' not found",
                request.name
            )));
        }
        let has_documents = Self::children(&self.documents, &request.name).next().is_some();
        if has_documents && !request.force {
            return Err(Status::failed_precondition(
                "corpus still contains documents; use force",
            ));
        }
        self.corpora.remove(&request.name);
        let prefix = format!("{}/", request.name);
        self.documents.retain(|name, _| !name.starts_with(&prefix));
        self.chunks.retain(|name, _| !name.starts_with(&prefix));
        self.permissions.retain(|name, _| !name.starts_with(&prefix));
        Ok(())
    }

    fn do_list_corpora(&self, _request: ListCorporaRequest) -> Items {
        Self::listing(
            self.corpora
                .values()
                .map(|record| Value::Object(record.clone()))
                .collect(),
        )
    }

    fn do_create_document(&mut self, request: CreateDocumentRequest) -> Result<Value, Status> {
        if !self.corpora.contains_key(&request.parent) {
            return Err(Status::not_found(format!(
                "corpus '{}' not found",
                request.parent
            )));
        }
        let mut record = Self::store_entity(&request.document);
        let name = match request.document.name.as_str() {
            "" => format!("{}/documents/doc-{}", request.parent, self.next_seq()),
            name => name.to_string(),
        };
        if self.documents.contains_key(&name) {
            return Err(Status::already_exists(format!("document '{name}' exists")));
        }
        record.insert("name".to_string(), Value::String(name.clone()));
        self.stamp_created(&mut record);
        self.documents.insert(name, record.clone());
        Ok(Value::Object(record))
    }

    fn do_get_document(&self, request: GetDocumentRequest) -> Result<Value, Status> {
        self.documents
            .get(&request.name)
            .map(|record| Value::Object(record.clone()))
            .ok_or_else(|| Status::not_found(format!("document '{}' not found", request.name)))
    }

    fn do_update_document(&mut self, request: UpdateDocumentRequest) -> Result<Value, Status> {
        let now = self.timestamp();
        let name = request.document.name.clone();
        let patch = Self::store_entity(&request.document);
        let record = self
            .documents
            .get_mut(&name)
            .ok_or_else(|| Status::not_found(format!("document '{name}' not found")))?;
        apply_mask(record, &patch, &request.update_mask)?;
        record.insert("update_time".to_string(), Value::String(now));
        Ok(Value::Object(record.clone()))
    }

    fn do_delete_document(&mut self, request: DeleteDocumentRequest) -> Result<(), Status> {
        if !self.documents.contains_key(&request.name) {
            return Err(Status::not_found(format!(
                "document '{}' not found",
                request.name
            )));
        }
        let has_chunks = Self::children(&self.chunks, &request.name).next().is_some();
        if has_chunks && !request.force {
            return Err(Status::failed_precondition(
                "document still contains chunks; use force",
            ));
        }
        self.documents.remove(&request.name);
        let prefix = format!("{}/", request.name);
        self.chunks.retain(|name, _| !name.starts_with(&prefix));
        Ok(())
    }

    fn do_list_documents(&self, request: ListDocumentsRequest) -> Items {
        Self::listing(
            Self::children(&self.documents, &request.parent)
                .map(|record| Value::Object(record.clone()))
                .collect(),
        )
    }

    fn do_create_chunk(&mut self, request: CreateChunkRequest) -> Result<Value, Status> {
        if !self.documents.contains_key(&request.parent) {
            return Err(Status::not_found(format!(
                "document '{}' not found",
                request.parent
            )));
        }
        let mut record = Self::store_entity(&request.chunk);
        let name = match request.chunk.name.as_str() {
            "" => format!("{}/chunks/chunk-{}", request.parent, self.next_seq()),
            name => name.to_string(),
        };
        if self.chunks.contains_key(&name) {
            return Err(Status::already_exists(format!("chunk '{name}' exists")));
        }
        record.insert("name".to_string(), Value::String(name.clone()));
        record.insert("state".to_string(), Value::String("STATE_ACTIVE".to_string()));
        self.stamp_created(&mut record);
        self.chunks.insert(name, record.clone());
        Ok(Value::Object(record))
    }

    fn do_get_chunk(&self, request: GetChunkRequest) -> Result<Value, Status> {
        self.chunks
            .get(&request.name)
            .map(|record| Value::Object(record.clone()))
            .ok_or_else(|| Status::not_found(format!("chunk '{}' not found", request.name)))
    }

    fn do_update_chunk(&mut self, request: UpdateChunkRequest) -> Result<Value, Status> {
        let now = self.timestamp();
        let name = request.chunk.name.clone();
        let patch = Self::store_entity(&request.chunk);
        let record = self
            .chunks
            .get_mut(&name)
            .ok_or_else(|| Status::not_found(format!("chunk '{name}' not found")))?;
        apply_mask(record, &patch, &request.update_mask)?;
        record.insert("update_time".to_string(), Value::String(now));
        Ok(Value::Object(record.clone()))
    }

    fn do_delete_chunk(&mut self, request: DeleteChunkRequest) -> Result<(), Status> {
        self.chunks
            .remove(&request.name)
            .map(|_| ())
            .ok_or_else(|| Status::not_found(format!("chunk '{}' not found", request.name)))
    }

    fn do_list_chunks(&self, request: ListChunksRequest) -> Items {
        Self::listing(
            Self::children(&self.chunks, &request.parent)
                .map(|record| Value::Object(record.clone()))
                .collect(),
        )
    }

    fn do_create_permission(&mut self, request: CreatePermissionRequest) -> Result<Value, Status> {
        if !self.corpora.contains_key(&request.parent) {
            return Err(Status::not_found(format!(
                "corpus '{}' not found",
                request.parent
            )));
        }
        let mut record = Self::store_entity(&request.permission);
        let name = format!("{}/permissions/perm-{}", request.parent, self.next_seq());
        record.insert("name".to_string(), Value::String(name.clone()));
        self.permissions.insert(name, record.clone());
        Ok(Value::Object(record))
    }

    fn do_list_permissions(&self, request: ListPermissionsRequest) -> Items {
        Self::listing(
            Self::children(&self.permissions, &request.parent)
                .map(|record| Value::Object(record.clone()))
                .collect(),
        )
    }
}

/// Copies the masked paths from the patch record into the stored record.
/// Only the dotted paths the library actually emits are supported.
fn apply_mask(
    record: &mut Map<String, Value>,
    patch: &Map<String, Value>,
    mask: &[String],
) -> Result<(), Status> {
    for path in mask {
        match path.split_once('.') {
            None => {
                let value = patch.get(path).cloned().unwrap_or(Value::Null);
                record.insert(path.clone(), value);
            }
            Some((head, leaf)) => {
                let patched = patch
                    .get(head)
                    .and_then(|nested| nested.get(leaf))
                    .cloned()
                    .unwrap_or(Value::Null);
                let nested = record
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match nested {
                    Value::Object(fields) => {
                        fields.insert(leaf.to_string(), patched);
                    }
                    _ => {
                        return Err(Status::invalid_argument(format!(
                            "field path '{path}' does not address a nested record"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

impl RetrieverService for MemoryRetriever {
    type Items = Items;

    fn create_corpus(&mut self, request: CreateCorpusRequest) -> Result<Value, Status> {
        self.do_create_corpus(request)
    }

    fn get_corpus(&mut self, request: GetCorpusRequest) -> Result<Value, Status> {
        self.do_get_corpus(request)
    }

    fn update_corpus(&mut self, request: UpdateCorpusRequest) -> Result<Value, Status> {
        self.do_update_corpus(request)
    }

    fn delete_corpus(&mut self, request: DeleteCorpusRequest) -> Result<(), Status> {
        self.do_delete_corpus(request)
    }

    fn list_corpora(&mut self, request: ListCorporaRequest) -> Result<Self::Items, Status> {
        Ok(self.do_list_corpora(request))
    }

    fn query_corpus(&mut self, request: QueryCorpusRequest) -> Result<Value, Status> {
        if !self.corpora.contains_key(&request.name) {
            return Err(Status::not_found(format!(
                "corpus '{}' not found",
                request.name
            )));
        }
        Ok(self.chunks_under(&request.name, request.results_count))
    }

    fn create_document(&mut self, request: CreateDocumentRequest) -> Result<Value, Status> {
        self.do_create_document(request)
    }

    fn get_document(&mut self, request: GetDocumentRequest) -> Result<Value, Status> {
        self.do_get_document(request)
    }

    fn update_document(&mut self, request: UpdateDocumentRequest) -> Result<Value, Status> {
        self.do_update_document(request)
    }

    fn delete_document(&mut self, request: DeleteDocumentRequest) -> Result<(), Status> {
        self.do_delete_document(request)
    }

    fn list_documents(&mut self, request: ListDocumentsRequest) -> Result<Self::Items, Status> {
        Ok(self.do_list_documents(request))
    }

    fn query_document(&mut self, request: QueryDocumentRequest) -> Result<Value, Status> {
        if !self.documents.contains_key(&request.name) {
            return Err(Status::not_found(format!(
                "document '{}' not found",
                request.name
            )));
        }
        Ok(self.chunks_under(&request.name, request.results_count))
    }

    fn create_chunk(&mut self, request: CreateChunkRequest) -> Result<Value, Status> {
        self.do_create_chunk(request)
    }

    fn batch_create_chunks(&mut self, request: BatchCreateChunksRequest) -> Result<Value, Status> {
        let mut chunks = Vec::with_capacity(request.requests.len());
        for create in request.requests {
            chunks.push(self.do_create_chunk(create)?);
        }
        Ok(json!({ "chunks": chunks }))
    }

    fn get_chunk(&mut self, request: GetChunkRequest) -> Result<Value, Status> {
        self.do_get_chunk(request)
    }

    fn update_chunk(&mut self, request: UpdateChunkRequest) -> Result<Value, Status> {
        self.do_update_chunk(request)
    }

    fn batch_update_chunks(&mut self, request: BatchUpdateChunksRequest) -> Result<Value, Status> {
        let mut chunks = Vec::with_capacity(request.requests.len());
        for update in request.requests {
            chunks.push(self.do_update_chunk(update)?);
        }
        Ok(json!({ "chunks": chunks }))
    }

    fn delete_chunk(&mut self, request: DeleteChunkRequest) -> Result<(), Status> {
        self.do_delete_chunk(request)
    }

    fn batch_delete_chunks(&mut self, request: BatchDeleteChunksRequest) -> Result<(), Status> {
        for delete in request.requests {
            self.do_delete_chunk(delete)?;
        }
        Ok(())
    }

    fn list_chunks(&mut self, request: ListChunksRequest) -> Result<Self::Items, Status> {
        Ok(self.do_list_chunks(request))
    }
}

impl AsyncRetrieverService for MemoryRetriever {
    type Items = tokio_stream::Iter<Items>;

    async fn create_corpus(&mut self, request: CreateCorpusRequest) -> Result<Value, Status> {
        self.do_create_corpus(request)
    }

    async fn get_corpus(&mut self, request: GetCorpusRequest) -> Result<Value, Status> {
        self.do_get_corpus(request)
    }

    async fn update_corpus(&mut self, request: UpdateCorpusRequest) -> Result<Value, Status> {
        self.do_update_corpus(request)
    }

    async fn delete_corpus(&mut self, request: DeleteCorpusRequest) -> Result<(), Status> {
        self.do_delete_corpus(request)
    }

    async fn list_corpora(&mut self, request: ListCorporaRequest) -> Result<Self::Items, Status> {
        Ok(tokio_stream::iter(self.do_list_corpora(request)))
    }

    async fn query_corpus(&mut self, request: QueryCorpusRequest) -> Result<Value, Status> {
        RetrieverService::query_corpus(self, request)
    }

    async fn create_document(&mut self, request: CreateDocumentRequest) -> Result<Value, Status> {
        self.do_create_document(request)
    }

    async fn get_document(&mut self, request: GetDocumentRequest) -> Result<Value, Status> {
        self.do_get_document(request)
    }

    async fn update_document(&mut self, request: UpdateDocumentRequest) -> Result<Value, Status> {
        self.do_update_document(request)
    }

    async fn delete_document(&mut self, request: DeleteDocumentRequest) -> Result<(), Status> {
        self.do_delete_document(request)
    }

    async fn list_documents(
        &mut self,
        request: ListDocumentsRequest,
    ) -> Result<Self::Items, Status> {
        Ok(tokio_stream::iter(self.do_list_documents(request)))
    }

    async fn query_document(&mut self, request: QueryDocumentRequest) -> Result<Value, Status> {
        RetrieverService::query_document(self, request)
    }

    async fn create_chunk(&mut self, request: CreateChunkRequest) -> Result<Value, Status> {
        self.do_create_chunk(request)
    }

    async fn batch_create_chunks(
        &mut self,
        request: BatchCreateChunksRequest,
    ) -> Result<Value, Status> {
        RetrieverService::batch_create_chunks(self, request)
    }

    async fn get_chunk(&mut self, request: GetChunkRequest) -> Result<Value, Status> {
        self.do_get_chunk(request)
    }

    async fn update_chunk(&mut self, request: UpdateChunkRequest) -> Result<Value, Status> {
        self.do_update_chunk(request)
    }

    async fn batch_update_chunks(
        &mut self,
        request: BatchUpdateChunksRequest,
    ) -> Result<Value, Status> {
        RetrieverService::batch_update_chunks(self, request)
    }

    async fn delete_chunk(&mut self, request: DeleteChunkRequest) -> Result<(), Status> {
        self.do_delete_chunk(request)
    }

    async fn batch_delete_chunks(
        &mut self,
        request: BatchDeleteChunksRequest,
    ) -> Result<(), Status> {
        RetrieverService::batch_delete_chunks(self, request)
    }

    async fn list_chunks(&mut self, request: ListChunksRequest) -> Result<Self::Items, Status> {
        Ok(tokio_stream::iter(self.do_list_chunks(request)))
    }
}

impl PermissionService for MemoryRetriever {
    type Items = Items;

    fn create_permission(&mut self, request: CreatePermissionRequest) -> Result<Value, Status> {
        self.do_create_permission(request)
    }

    fn list_permissions(&mut self, request: ListPermissionsRequest) -> Result<Self::Items, Status> {
        Ok(self.do_list_permissions(request))
    }
}

impl AsyncPermissionService for MemoryRetriever {
    type Items = tokio_stream::Iter<Items>;

    async fn create_permission(
        &mut self,
        request: CreatePermissionRequest,
    ) -> Result<Value, Status> {
        self.do_create_permission(request)
    }

    async fn list_permissions(
        &mut self,
        request: ListPermissionsRequest,
    ) -> Result<Self::Items, Status> {
        Ok(tokio_stream::iter(self.do_list_permissions(request)))
    }
}
