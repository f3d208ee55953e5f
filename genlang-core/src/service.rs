//! # Service Boundary
//!
//! The remote platform is represented here as plain traits over raw wire
//! records. Requests are serde-serializable structs mirroring the RPC
//! surface; responses are `serde_json::Value` objects that the [`crate::decode`]
//! module turns into canonical types. Remote failures are [`tonic::Status`]
//! values and pass through unmodified.
//!
//! Every trait has a blocking and an async form. The async traits use
//! native `async fn` and stream list results; implementations decide how
//! pagination maps onto the returned iterator/stream.
use crate::types::permission::Permission;
use crate::types::retriever::{Chunk, Corpus, Document, MetadataFilter};
use crate::update::FieldMask;
use futures_util::Stream;
use serde::Serialize;
use serde_json::Value;
use tonic::Status;

#[derive(Debug, Clone, Serialize)]
pub struct CreateCorpusRequest {
    pub corpus: Corpus,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetCorpusRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCorpusRequest {
    pub corpus: Corpus,
    pub update_mask: FieldMask,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteCorpusRequest {
    pub name: String,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCorporaRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryCorpusRequest {
    pub name: String,
    pub query: String,
    pub metadata_filters: Vec<MetadataFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDocumentRequest {
    pub parent: String,
    pub document: Document,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetDocumentRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateDocumentRequest {
    pub document: Document,
    pub update_mask: FieldMask,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteDocumentRequest {
    pub name: String,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListDocumentsRequest {
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryDocumentRequest {
    pub name: String,
    pub query: String,
    pub metadata_filters: Vec<MetadataFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateChunkRequest {
    pub parent: String,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCreateChunksRequest {
    pub parent: String,
    pub requests: Vec<CreateChunkRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetChunkRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateChunkRequest {
    pub chunk: Chunk,
    pub update_mask: FieldMask,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateChunksRequest {
    pub parent: String,
    pub requests: Vec<UpdateChunkRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteChunkRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchDeleteChunksRequest {
    pub parent: String,
    pub requests: Vec<DeleteChunkRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListChunksRequest {
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePermissionRequest {
    pub parent: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPermissionsRequest {
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
}

/// Blocking client for the retriever service (corpora, documents, chunks).
///
/// List operations yield raw records one at a time; implementations are
/// expected to drive pagination internally.
pub trait RetrieverService {
    type Items: Iterator<Item = Result<Value, Status>>;

    fn create_corpus(&mut self, request: CreateCorpusRequest) -> Result<Value, Status>;
    fn get_corpus(&mut self, request: GetCorpusRequest) -> Result<Value, Status>;
    fn update_corpus(&mut self, request: UpdateCorpusRequest) -> Result<Value, Status>;
    fn delete_corpus(&mut self, request: DeleteCorpusRequest) -> Result<(), Status>;
    fn list_corpora(&mut self, request: ListCorporaRequest) -> Result<Self::Items, Status>;
    fn query_corpus(&mut self, request: QueryCorpusRequest) -> Result<Value, Status>;

    fn create_document(&mut self, request: CreateDocumentRequest) -> Result<Value, Status>;
    fn get_document(&mut self, request: GetDocumentRequest) -> Result<Value, Status>;
    fn update_document(&mut self, request: UpdateDocumentRequest) -> Result<Value, Status>;
    fn delete_document(&mut self, request: DeleteDocumentRequest) -> Result<(), Status>;
    fn list_documents(&mut self, request: ListDocumentsRequest) -> Result<Self::Items, Status>;
    fn query_document(&mut self, request: QueryDocumentRequest) -> Result<Value, Status>;

    fn create_chunk(&mut self, request: CreateChunkRequest) -> Result<Value, Status>;
    fn batch_create_chunks(&mut self, request: BatchCreateChunksRequest) -> Result<Value, Status>;
    fn get_chunk(&mut self, request: GetChunkRequest) -> Result<Value, Status>;
    fn update_chunk(&mut self, request: UpdateChunkRequest) -> Result<Value, Status>;
    fn batch_update_chunks(&mut self, request: BatchUpdateChunksRequest) -> Result<Value, Status>;
    fn delete_chunk(&mut self, request: DeleteChunkRequest) -> Result<(), Status>;
    fn batch_delete_chunks(&mut self, request: BatchDeleteChunksRequest) -> Result<(), Status>;
    fn list_chunks(&mut self, request: ListChunksRequest) -> Result<Self::Items, Status>;
}

/// Async client for the retriever service. Mirrors [`RetrieverService`]
/// with streamed list results.
pub trait AsyncRetrieverService {
    type Items: Stream<Item = Result<Value, Status>> + Send + Unpin;

    fn create_corpus(
        &mut self,
        request: CreateCorpusRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn get_corpus(
        &mut self,
        request: GetCorpusRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn update_corpus(
        &mut self,
        request: UpdateCorpusRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn delete_corpus(
        &mut self,
        request: DeleteCorpusRequest,
    ) -> impl Future<Output = Result<(), Status>> + Send;
    fn list_corpora(
        &mut self,
        request: ListCorporaRequest,
    ) -> impl Future<Output = Result<Self::Items, Status>> + Send;
    fn query_corpus(
        &mut self,
        request: QueryCorpusRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;

    fn create_document(
        &mut self,
        request: CreateDocumentRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn get_document(
        &mut self,
        request: GetDocumentRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn update_document(
        &mut self,
        request: UpdateDocumentRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn delete_document(
        &mut self,
        request: DeleteDocumentRequest,
    ) -> impl Future<Output = Result<(), Status>> + Send;
    fn list_documents(
        &mut self,
        request: ListDocumentsRequest,
    ) -> impl Future<Output = Result<Self::Items, Status>> + Send;
    fn query_document(
        &mut self,
        request: QueryDocumentRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;

    fn create_chunk(
        &mut self,
        request: CreateChunkRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn batch_create_chunks(
        &mut self,
        request: BatchCreateChunksRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn get_chunk(
        &mut self,
        request: GetChunkRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn update_chunk(
        &mut self,
        request: UpdateChunkRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn batch_update_chunks(
        &mut self,
        request: BatchUpdateChunksRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn delete_chunk(
        &mut self,
        request: DeleteChunkRequest,
    ) -> impl Future<Output = Result<(), Status>> + Send;
    fn batch_delete_chunks(
        &mut self,
        request: BatchDeleteChunksRequest,
    ) -> impl Future<Output = Result<(), Status>> + Send;
    fn list_chunks(
        &mut self,
        request: ListChunksRequest,
    ) -> impl Future<Output = Result<Self::Items, Status>> + Send;
}

/// Blocking client for the permission service.
pub trait PermissionService {
    type Items: Iterator<Item = Result<Value, Status>>;

    fn create_permission(&mut self, request: CreatePermissionRequest) -> Result<Value, Status>;
    fn list_permissions(&mut self, request: ListPermissionsRequest) -> Result<Self::Items, Status>;
}

/// Async client for the permission service.
pub trait AsyncPermissionService {
    type Items: Stream<Item = Result<Value, Status>> + Send + Unpin;

    fn create_permission(
        &mut self,
        request: CreatePermissionRequest,
    ) -> impl Future<Output = Result<Value, Status>> + Send;
    fn list_permissions(
        &mut self,
        request: ListPermissionsRequest,
    ) -> impl Future<Output = Result<Self::Items, Status>> + Send;
}
