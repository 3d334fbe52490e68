//! Query-time retrieval: embed the query, search the store.

use crate::embeddings::Embedder;
use crate::store::VectorStore;
use crate::types::RetrievalResult;
use consult_core::AppResult;
use std::sync::Arc;

pub struct Retriever {
    embedder: Arc<Embedder>,
    store: Arc<VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<Embedder>, store: Arc<VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Top `top_k` stored documents for `query_text`, most similar first.
    pub async fn retrieve(&self, query_text: &str, top_k: usize) -> AppResult<Vec<RetrievalResult>> {
        let query_embedding = self.embedder.embed_one(query_text).await?;
        let results = self.store.search(&query_embedding, top_k).await?;

        if let Some(best) = results.first() {
            tracing::debug!(
                "Retrieved {} documents (top score: {:.3})",
                results.len(),
                best.score
            );
        } else {
            tracing::debug!("Retrieved no documents");
        }

        Ok(results)
    }
}
