//! Test doubles shared by the pipeline tests.

use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::Embedder;
use crate::index::SqliteIndex;
use crate::store::VectorStore;
use crate::types::{Document, RetrievalResult};
use crate::vector_index::VectorIndex;
use consult_core::{AppError, AppResult};
use consult_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Answer returned once the scripted replies run out.
pub(crate) const DEFAULT_REPLY: &str = "scripted answer";

/// In-process generation backend that replays canned replies and records
/// every prompt it receives.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    failures: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub(crate) fn replying(replies: &[&str]) -> Arc<Self> {
        Self::failing_first(0, replies)
    }

    /// Every call fails as if the backend were down.
    pub(crate) fn failing() -> Arc<Self> {
        Self::failing_first(usize::MAX, &[])
    }

    /// The first `failures` calls fail, later calls replay `replies`.
    pub(crate) fn failing_first(failures: usize, replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            failures: AtomicUsize::new(failures),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::GenerationUnavailable(
                "scripted backend is down".to_string(),
            ));
        }

        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

/// Index whose batch inserts always fail; everything else passes through.
pub(crate) struct ReadOnlyIndex {
    pub(crate) inner: SqliteIndex,
}

impl VectorIndex for ReadOnlyIndex {
    fn insert_batch(&self, _documents: &[Document]) -> AppResult<usize> {
        Err(AppError::StoreUnavailable("disk is read-only".to_string()))
    }

    fn upsert(&self, document: &Document) -> AppResult<()> {
        self.inner.upsert(document)
    }

    fn delete(&self, id: &str) -> AppResult<bool> {
        self.inner.delete(id)
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<RetrievalResult>> {
        self.inner.search(query_embedding, top_k)
    }

    fn list_all(&self) -> AppResult<Vec<Document>> {
        self.inner.list_all()
    }

    fn get(&self, id: &str) -> AppResult<Option<Document>> {
        self.inner.get(id)
    }

    fn count(&self) -> AppResult<usize> {
        self.inner.count()
    }

    fn dimension(&self) -> AppResult<Option<usize>> {
        self.inner.dimension()
    }

    fn reset(&self) -> AppResult<()> {
        self.inner.reset()
    }
}

pub(crate) fn trigram_embedder() -> Arc<Embedder> {
    Arc::new(Embedder::new(Arc::new(TrigramProvider::new(384))))
}

/// Empty in-memory store with the deterministic embedder.
pub(crate) fn memory_store() -> Arc<VectorStore> {
    Arc::new(VectorStore::new(
        Arc::new(SqliteIndex::open_in_memory().unwrap()),
        trigram_embedder(),
    ))
}

pub(crate) const FRANCHISE_DOCS: [&str; 2] = [
    "Franchise territory rules grant each franchisee an exclusive protected area.",
    "Franchise fees include an initial fee and a monthly royalty on gross sales.",
];

/// In-memory store holding the two franchise documents.
pub(crate) async fn franchise_store() -> Arc<VectorStore> {
    let store = memory_store();
    store
        .add(
            FRANCHISE_DOCS.iter().map(|d| d.to_string()).collect(),
            None,
            None,
        )
        .await
        .unwrap();
    store
}
