//! Document store: embedding plus durable vector index.

use crate::embeddings::Embedder;
use crate::index::SqliteIndex;
use crate::types::{default_metadata, Document, Metadata, RetrievalResult, StoreStats};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use consult_core::{AppConfig, AppError, AppResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Default number of documents embedded per batch during `add`.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Persistent collection of embedded documents.
///
/// Cheap to share: wrap in `Arc` and hand the same handle to every consumer.
pub struct VectorStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<Embedder>,
    batch_size: usize,
    db_size: Option<Arc<SqliteIndex>>,
}

impl VectorStore {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<Embedder>) -> Self {
        Self {
            index,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            db_size: None,
        }
    }

    /// Open the SQLite store at the configured directory.
    pub fn open(config: &AppConfig, embedder: Arc<Embedder>) -> AppResult<Self> {
        let dir = config.store_dir();
        tracing::debug!("Opening vector store at {:?}", dir);

        let index = Arc::new(SqliteIndex::open(&dir)?);
        Ok(Self {
            index: index.clone(),
            embedder,
            batch_size: config.store.batch_size.max(1),
            db_size: Some(index),
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn embedder(&self) -> &Arc<Embedder> {
        &self.embedder
    }

    /// Embed and insert documents.
    ///
    /// Ids default to fresh UUIDs and metadata to `{"source": "default"}`.
    /// Texts are embedded in batches, but the insert is a single atomic
    /// write, so a failure leaves the store unchanged.
    ///
    /// # Errors
    /// - `InvalidArgument` on length mismatches or duplicate/existing ids
    /// - `ModelUnavailable` if embedding fails
    /// - `StoreUnavailable` if the write fails
    pub async fn add(
        &self,
        texts: Vec<String>,
        ids: Option<Vec<String>>,
        metadatas: Option<Vec<Metadata>>,
    ) -> AppResult<usize> {
        if texts.is_empty() {
            return Ok(0);
        }

        let ids = match ids {
            Some(ids) if ids.len() != texts.len() => {
                return Err(AppError::InvalidArgument(format!(
                    "Got {} ids for {} documents",
                    ids.len(),
                    texts.len()
                )))
            }
            Some(ids) => ids,
            None => texts
                .iter()
                .map(|_| uuid::Uuid::new_v4().to_string())
                .collect(),
        };

        let metadatas = match metadatas {
            Some(m) if m.len() != texts.len() => {
                return Err(AppError::InvalidArgument(format!(
                    "Got {} metadata entries for {} documents",
                    m.len(),
                    texts.len()
                )))
            }
            Some(m) => m,
            None => vec![default_metadata(); texts.len()],
        };

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(AppError::InvalidArgument(format!(
                "Duplicate document id '{}' in one add",
                dup
            )));
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (n, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!("Embedding batch {} ({} documents)", n + 1, batch.len());
            embeddings.extend(self.embedder.embed(batch).await?);
        }

        let stored_at = Utc::now();
        let documents: Vec<Document> = texts
            .into_iter()
            .zip(ids)
            .zip(metadatas)
            .zip(embeddings)
            .map(|(((text, id), metadata), embedding)| Document {
                id,
                text,
                embedding,
                metadata,
                stored_at,
            })
            .collect();

        let added = self.index.insert_batch(&documents)?;
        tracing::info!("Added {} documents to the vector store", added);
        Ok(added)
    }

    /// Insert or replace one document, returning its id.
    pub async fn upsert(
        &self,
        text: String,
        id: Option<String>,
        metadata: Option<Metadata>,
    ) -> AppResult<String> {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let embedding = self.embedder.embed_one(&text).await?;

        self.index.upsert(&Document {
            id: id.clone(),
            text,
            embedding,
            metadata: metadata.unwrap_or_else(default_metadata),
            stored_at: Utc::now(),
        })?;

        tracing::debug!("Upserted document '{}'", id);
        Ok(id)
    }

    /// Delete by id; absent ids are a no-op. Returns whether a record was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let removed = self.index.delete(id)?;
        if removed {
            tracing::info!("Deleted document '{}'", id);
        } else {
            tracing::debug!("Delete of unknown document '{}' ignored", id);
        }
        Ok(removed)
    }

    /// Exact nearest-neighbor search by embedding.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<RetrievalResult>> {
        self.index.search(query_embedding, top_k)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Document>> {
        self.index.list_all()
    }

    pub async fn count(&self) -> AppResult<usize> {
        self.index.count()
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Document>> {
        self.index.get(id)
    }

    /// Remove every document.
    pub async fn reset(&self) -> AppResult<()> {
        self.index.reset()
    }

    pub async fn stats(&self) -> AppResult<StoreStats> {
        Ok(StoreStats {
            documents_count: self.index.count()?,
            dimension: self.index.dimension()?,
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            db_size_bytes: self.db_size.as_ref().map(|i| i.size_bytes()).unwrap_or(0),
        })
    }
}
