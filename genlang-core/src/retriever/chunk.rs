//! Chunk-level operations.
use super::RetrieverError;
use crate::service::{AsyncRetrieverService, RetrieverService, UpdateChunkRequest};
use crate::types::retriever::Chunk;
use crate::update::apply_update_paths;
use serde_json::{Map, Value};

impl Chunk {
    /// Applies a partial update to this chunk (only `data.string_value`
    /// can be updated) and sends it with the derived field mask.
    pub fn update(
        &mut self,
        service: &mut impl RetrieverService,
        updates: Map<String, Value>,
    ) -> Result<(), RetrieverError> {
        let update_mask = apply_update_paths(self, updates)?;
        let request = UpdateChunkRequest {
            chunk: self.clone(),
            update_mask,
        };
        tracing::debug!(name = %request.chunk.name, mask = ?request.update_mask, "update_chunk");
        service.update_chunk(request)?;
        Ok(())
    }

    /// Async form of [`Chunk::update`].
    pub async fn update_async(
        &mut self,
        service: &mut impl AsyncRetrieverService,
        updates: Map<String, Value>,
    ) -> Result<(), RetrieverError> {
        let update_mask = apply_update_paths(self, updates)?;
        let request = UpdateChunkRequest {
            chunk: self.clone(),
            update_mask,
        };
        tracing::debug!(name = %request.chunk.name, mask = ?request.update_mask, "update_chunk");
        service.update_chunk(request).await?;
        Ok(())
    }
}
