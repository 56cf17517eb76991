//! Stored cover embeddings

use super::{EmbeddingSet, EmbeddingVector};
use crate::error::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Persistent map from record id to its cover vectors
///
/// `put` replaces the full vector set of one record.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn get_all(&self) -> Result<EmbeddingSet, StoreError>;

    async fn put(&self, record_id: RecordId, vectors: Vec<EmbeddingVector>)
        -> Result<(), StoreError>;

    /// Ids of records that currently have stored vectors
    async fn record_ids(&self) -> Result<Vec<RecordId>, StoreError> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|(_, vectors)| !vectors.is_empty())
            .map(|(id, _)| id)
            .collect())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryEmbeddingStore {
    embeddings: RwLock<EmbeddingSet>,
}

impl MemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embeddings(embeddings: EmbeddingSet) -> Self {
        Self {
            embeddings: RwLock::new(embeddings),
        }
    }
}

#[async_trait]
impl EmbeddingStore for MemoryEmbeddingStore {
    async fn get_all(&self) -> Result<EmbeddingSet, StoreError> {
        Ok(self.embeddings.read().await.clone())
    }

    async fn put(
        &self,
        record_id: RecordId,
        vectors: Vec<EmbeddingVector>,
    ) -> Result<(), StoreError> {
        self.embeddings.write().await.insert(record_id, vectors);
        Ok(())
    }
}
