//! Corpus-level operations: document CRUD, semantic queries, permissions.
use super::RetrieverError;
use crate::decode::{decode_document, decode_permission, decode_relevant_chunks};
use crate::name::{qualify, valid_name};
use crate::service::{
    AsyncPermissionService, AsyncRetrieverService, CreateDocumentRequest, CreatePermissionRequest,
    DeleteDocumentRequest, GetDocumentRequest, ListDocumentsRequest, ListPermissionsRequest,
    PermissionService, QueryCorpusRequest, RetrieverService, UpdateCorpusRequest,
};
use crate::types::permission::{GranteeType, Permission, Role};
use crate::types::retriever::{
    Corpus, CustomMetadata, Document, MetadataFilter, RelevantChunk,
};
use crate::update::apply_update_paths;
use futures_util::{Stream, StreamExt};
use serde_json::{Map, Value};
use tonic::Status;

impl Corpus {
    fn create_document_request(
        &self,
        name: Option<&str>,
        display_name: Option<&str>,
        custom_metadata: Vec<CustomMetadata>,
    ) -> Result<CreateDocumentRequest, RetrieverError> {
        let document_name = match name {
            None => String::new(),
            Some(name) if valid_name(name) => format!("{}/documents/{name}", self.name),
            Some(name) => {
                return Err(RetrieverError::InvalidName {
                    name: name.to_string(),
                    length: name.len(),
                });
            }
        };
        Ok(CreateDocumentRequest {
            parent: self.name.clone(),
            document: Document {
                name: document_name,
                display_name: display_name.unwrap_or_default().to_string(),
                custom_metadata,
                ..Document::default()
            },
        })
    }

    /// Creates a document in this corpus.
    ///
    /// A provided id must pass [`valid_name`] and is qualified under
    /// `{corpus}/documents/`; an omitted id is assigned by the service.
    pub fn create_document(
        &self,
        service: &mut impl RetrieverService,
        name: Option<&str>,
        display_name: Option<&str>,
        custom_metadata: Vec<CustomMetadata>,
    ) -> Result<Document, RetrieverError> {
        let request = self.create_document_request(name, display_name, custom_metadata)?;
        tracing::debug!(parent = %request.parent, name = %request.document.name, "create_document");
        Ok(decode_document(service.create_document(request)?)?)
    }

    /// Async form of [`Corpus::create_document`].
    pub async fn create_document_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        name: Option<&str>,
        display_name: Option<&str>,
        custom_metadata: Vec<CustomMetadata>,
    ) -> Result<Document, RetrieverError> {
        let request = self.create_document_request(name, display_name, custom_metadata)?;
        tracing::debug!(parent = %request.parent, name = %request.document.name, "create_document");
        Ok(decode_document(service.create_document(request).await?)?)
    }

    fn get_document_request(&self, name: &str) -> GetDocumentRequest {
        GetDocumentRequest {
            name: qualify(&self.name, "documents", name),
        }
    }

    /// Fetches a document by full name or bare id.
    pub fn get_document(
        &self,
        service: &mut impl RetrieverService,
        name: &str,
    ) -> Result<Document, RetrieverError> {
        let request = self.get_document_request(name);
        tracing::debug!(name = %request.name, "get_document");
        Ok(decode_document(service.get_document(request)?)?)
    }

    /// Async form of [`Corpus::get_document`].
    pub async fn get_document_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        name: &str,
    ) -> Result<Document, RetrieverError> {
        let request = self.get_document_request(name);
        tracing::debug!(name = %request.name, "get_document");
        Ok(decode_document(service.get_document(request).await?)?)
    }

    /// Applies a partial update to this corpus (only `display_name` can be
    /// updated) and sends it with the derived field mask. The local entity
    /// is only mutated if the whole payload validates.
    pub fn update(
        &mut self,
        service: &mut impl RetrieverService,
        updates: Map<String, Value>,
    ) -> Result<(), RetrieverError> {
        let update_mask = apply_update_paths(self, updates)?;
        let request = UpdateCorpusRequest {
            corpus: self.clone(),
            update_mask,
        };
        tracing::debug!(name = %request.corpus.name, mask = ?request.update_mask, "update_corpus");
        service.update_corpus(request)?;
        Ok(())
    }

    /// Async form of [`Corpus::update`].
    pub async fn update_async(
        &mut self,
        service: &mut impl AsyncRetrieverService,
        updates: Map<String, Value>,
    ) -> Result<(), RetrieverError> {
        let update_mask = apply_update_paths(self, updates)?;
        let request = UpdateCorpusRequest {
            corpus: self.clone(),
            update_mask,
        };
        tracing::debug!(name = %request.corpus.name, mask = ?request.update_mask, "update_corpus");
        service.update_corpus(request).await?;
        Ok(())
    }

    fn query_request(
        &self,
        query: &str,
        metadata_filters: Vec<MetadataFilter>,
        results_count: Option<i32>,
    ) -> Result<QueryCorpusRequest, RetrieverError> {
        if let Some(count) = results_count
            && count > 100
        {
            return Err(RetrieverError::ResultsCountOutOfRange(count));
        }
        Ok(QueryCorpusRequest {
            name: self.name.clone(),
            query: query.to_string(),
            metadata_filters,
            results_count,
        })
    }

    /// Performs a semantic search over every chunk of this corpus.
    ///
    /// `results_count` above 100 is rejected before any request is sent.
    pub fn query(
        &self,
        service: &mut impl RetrieverService,
        query: &str,
        metadata_filters: Vec<MetadataFilter>,
        results_count: Option<i32>,
    ) -> Result<Vec<RelevantChunk>, RetrieverError> {
        let request = self.query_request(query, metadata_filters, results_count)?;
        tracing::debug!(name = %request.name, "query_corpus");
        Ok(decode_relevant_chunks(service.query_corpus(request)?)?)
    }

    /// Async form of [`Corpus::query`].
    pub async fn query_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        query: &str,
        metadata_filters: Vec<MetadataFilter>,
        results_count: Option<i32>,
    ) -> Result<Vec<RelevantChunk>, RetrieverError> {
        let request = self.query_request(query, metadata_filters, results_count)?;
        tracing::debug!(name = %request.name, "query_corpus");
        Ok(decode_relevant_chunks(service.query_corpus(request).await?)?)
    }

    fn delete_document_request(&self, name: &str, force: bool) -> DeleteDocumentRequest {
        DeleteDocumentRequest {
            name: qualify(&self.name, "documents", name),
            force,
        }
    }

    /// Deletes a document. `force` also deletes the chunks it contains.
    pub fn delete_document(
        &self,
        service: &mut impl RetrieverService,
        name: &str,
        force: bool,
    ) -> Result<(), RetrieverError> {
        let request = self.delete_document_request(name, force);
        tracing::debug!(name = %request.name, force, "delete_document");
        Ok(service.delete_document(request)?)
    }

    /// Async form of [`Corpus::delete_document`].
    pub async fn delete_document_async(
        &self,
        service: &mut impl AsyncRetrieverService,
        name: &str,
        force: bool,
    ) -> Result<(), RetrieverError> {
        let request = self.delete_document_request(name, force);
        tracing::debug!(name = %request.name, force, "delete_document");
        Ok(service.delete_document(request).await?)
    }

    /// Lists the documents of this corpus lazily.
    pub fn list_documents<S: RetrieverService>(
        &self,
        service: &mut S,
        page_size: Option<i32>,
    ) -> Result<impl Iterator<Item = Result<Document, RetrieverError>>, RetrieverError> {
        tracing::debug!(parent = %self.name, ?page_size, "list_documents");
        let items = service.list_documents(ListDocumentsRequest {
            parent: self.name.clone(),
            page_size,
        })?;
        Ok(items.map(decode_document_item))
    }

    /// Async form of [`Corpus::list_documents`].
    pub async fn list_documents_async<S: AsyncRetrieverService>(
        &self,
        service: &mut S,
        page_size: Option<i32>,
    ) -> Result<impl Stream<Item = Result<Document, RetrieverError>> + Unpin, RetrieverError> {
        tracing::debug!(parent = %self.name, ?page_size, "list_documents");
        let items = service
            .list_documents(ListDocumentsRequest {
                parent: self.name.clone(),
                page_size,
            })
            .await?;
        Ok(items.map(decode_document_item))
    }

    fn create_permission_request(
        &self,
        role: Role,
        grantee_type: GranteeType,
        email_address: Option<&str>,
    ) -> Result<CreatePermissionRequest, RetrieverError> {
        match (email_address, grantee_type) {
            (Some(email), GranteeType::Everyone) => {
                return Err(RetrieverError::EmailForEveryone(email.to_string()));
            }
            (None, grantee) if grantee != GranteeType::Everyone => {
                return Err(RetrieverError::MissingEmailAddress);
            }
            _ => {}
        }
        Ok(CreatePermissionRequest {
            parent: self.name.clone(),
            permission: Permission {
                name: None,
                role,
                grantee_type,
                email_address: email_address.map(str::to_string),
            },
        })
    }

    /// Grants a role on this corpus.
    ///
    /// An `EVERYONE` grant must not carry an email address; every other
    /// grantee type requires one.
    pub fn create_permission(
        &self,
        service: &mut impl PermissionService,
        role: Role,
        grantee_type: GranteeType,
        email_address: Option<&str>,
    ) -> Result<Permission, RetrieverError> {
        let request = self.create_permission_request(role, grantee_type, email_address)?;
        tracing::debug!(parent = %request.parent, "create_permission");
        Ok(decode_permission(service.create_permission(request)?)?)
    }

    /// Async form of [`Corpus::create_permission`].
    pub async fn create_permission_async(
        &self,
        service: &mut impl AsyncPermissionService,
        role: Role,
        grantee_type: GranteeType,
        email_address: Option<&str>,
    ) -> Result<Permission, RetrieverError> {
        let request = self.create_permission_request(role, grantee_type, email_address)?;
        tracing::debug!(parent = %request.parent, "create_permission");
        Ok(decode_permission(service.create_permission(request).await?)?)
    }

    /// Lists the permissions enforced on this corpus lazily.
    pub fn list_permissions<S: PermissionService>(
        &self,
        service: &mut S,
        page_size: Option<i32>,
    ) -> Result<impl Iterator<Item = Result<Permission, RetrieverError>>, RetrieverError> {
        tracing::debug!(parent = %self.name, ?page_size, "list_permissions");
        let items = service.list_permissions(ListPermissionsRequest {
            parent: self.name.clone(),
            page_size,
        })?;
        Ok(items.map(decode_permission_item))
    }

    /// Async form of [`Corpus::list_permissions`].
    pub async fn list_permissions_async<S: AsyncPermissionService>(
        &self,
        service: &mut S,
        page_size: Option<i32>,
    ) -> Result<impl Stream<Item = Result<Permission, RetrieverError>> + Unpin, RetrieverError>
    {
        tracing::debug!(parent = %self.name, ?page_size, "list_permissions");
        let items = service
            .list_permissions(ListPermissionsRequest {
                parent: self.name.clone(),
                page_size,
            })
            .await?;
        Ok(items.map(decode_permission_item))
    }
}

fn decode_document_item(item: Result<Value, Status>) -> Result<Document, RetrieverError> {
    Ok(decode_document(item?)?)
}

fn decode_permission_item(item: Result<Value, Status>) -> Result<Permission, RetrieverError> {
    Ok(decode_permission(item?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        Corpus {
            name: "corpora/c1".to_string(),
            ..Corpus::default()
        }
    }

    #[test]
    fn document_ids_are_validated_and_qualified() {
        let request = corpus()
            .create_document_request(Some("doc-1"), Some("Doc"), Vec::new())
            .unwrap();
        assert_eq!(request.document.name, "corpora/c1/documents/doc-1");
        assert_eq!(request.parent, "corpora/c1");

        let err = corpus()
            .create_document_request(Some("Bad Name"), None, Vec::new())
            .unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidName { .. }));
    }

    #[test]
    fn query_rejects_oversized_results_count() {
        let err = corpus()
            .query_request("q", Vec::new(), Some(101))
            .unwrap_err();
        assert!(matches!(err, RetrieverError::ResultsCountOutOfRange(101)));
        assert!(corpus().query_request("q", Vec::new(), Some(100)).is_ok());
        // Unlike Document::query, negative counts pass through here.
        assert!(corpus().query_request("q", Vec::new(), Some(-5)).is_ok());
    }

    #[test]
    fn permission_grantee_email_exclusivity() {
        let c = corpus();
        assert!(matches!(
            c.create_permission_request(Role::Reader, GranteeType::Everyone, Some("a@b.c")),
            Err(RetrieverError::EmailForEveryone(_))
        ));
        assert!(matches!(
            c.create_permission_request(Role::Reader, GranteeType::User, None),
            Err(RetrieverError::MissingEmailAddress)
        ));
        assert!(
            c.create_permission_request(Role::Reader, GranteeType::Everyone, None)
                .is_ok()
        );
        assert!(
            c.create_permission_request(Role::Writer, GranteeType::User, Some("a@b.c"))
                .is_ok()
        );
    }
}
