//! End-to-end query pipeline.
//!
//! `Received → Rewritten → Retrieved → Guarded → Answered | Refused`
//!
//! Uploads are added to the context verbatim; they are only embedded when
//! persisted, after the answer has been generated. Dropping the future
//! returned by [`RagOrchestrator::answer`] before completion therefore never
//! leaves a partial write behind.

use crate::rag::guardrail::{Decision, DomainScope, GuardrailPolicy};
use crate::rag::retriever::Retriever;
use crate::rag::rewrite::QueryRewriter;
use crate::rag::types::{
    format_transcript, Outcome, RagRequest, RagResponse, RequestState, Upload, VectorEntry,
};
use crate::store::VectorStore;
use crate::types::{Metadata, SOURCE_KEY};
use consult_core::{AppConfig, AppError, AppResult};
use consult_llm::Generator;
use consult_prompt::{build_prompt, PromptDefinition, PromptLibrary};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;

/// Retrieval depth when neither request nor config sets one.
pub const DEFAULT_TOP_K: usize = 3;

/// Metadata source for persisted uploads.
pub const USER_UPLOAD_SOURCE: &str = "user_upload";

pub struct RagOrchestrator {
    rewriter: QueryRewriter,
    retriever: Retriever,
    guardrail: GuardrailPolicy,
    generator: Arc<Generator>,
    store: Arc<VectorStore>,
    answer_prompt: PromptDefinition,
    scope: DomainScope,
    top_k: usize,
}

impl RagOrchestrator {
    pub fn new(
        store: Arc<VectorStore>,
        generator: Arc<Generator>,
        prompts: &PromptLibrary,
        scope: DomainScope,
    ) -> Self {
        Self {
            rewriter: QueryRewriter::new(generator.clone(), prompts.rewrite().clone()),
            retriever: Retriever::new(store.embedder().clone(), store.clone()),
            guardrail: GuardrailPolicy,
            generator,
            store,
            answer_prompt: prompts.answer().clone(),
            scope,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Wire the pipeline from configuration, resolving prompt overrides in
    /// the workspace.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<VectorStore>,
        generator: Arc<Generator>,
    ) -> AppResult<Self> {
        let prompts = PromptLibrary::load(&config.prompts_dir())?;
        Ok(Self::new(store, generator, &prompts, DomainScope::from(&config.domain))
            .with_top_k(config.retrieval.top_k))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer one question.
    ///
    /// # Errors
    /// - `InvalidArgument` for a blank question
    /// - `ModelUnavailable` or `StoreUnavailable` if retrieval fails
    /// - `GenerationUnavailable` if the answer cannot be generated
    ///
    /// Rewrite failures and upload persistence failures do not fail the
    /// request.
    pub async fn answer(&self, request: RagRequest) -> AppResult<RagResponse> {
        let span = tracing::info_span!(
            "rag_request",
            provider = %request.provider,
            history = request.chat_history.len(),
            uploads = request.uploads.len(),
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: RagRequest) -> AppResult<RagResponse> {
        if request.query_text.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Query text must not be blank".to_string(),
            ));
        }
        transition(RequestState::Received);

        let uploads: Vec<(&Upload, String)> = request
            .uploads
            .iter()
            .map(|u| (u, u.decode()))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();

        let rewrite = self
            .rewriter
            .rewrite(&request.query_text, &request.chat_history, request.provider)
            .await?;
        let standalone_query = rewrite.into_query();
        transition(RequestState::Rewritten);

        let top_k = request.top_k.unwrap_or(self.top_k);
        let retrieved = self.retriever.retrieve(&standalone_query, top_k).await?;
        transition(RequestState::Retrieved);

        let extra_docs: Vec<String> = uploads.iter().map(|(_, text)| text.clone()).collect();
        let decision = self.guardrail.evaluate(&retrieved, &extra_docs);
        transition(RequestState::Guarded);

        let context = match decision {
            Decision::Proceed(context) => context,
            Decision::Refuse(reason) => {
                tracing::info!(reason = %reason, "Refusing request");
                transition(RequestState::Refused);
                return Ok(RagResponse {
                    answer: self.scope.refusal(),
                    context: Vec::new(),
                    used_user_docs: false,
                    saved_user_docs: false,
                    outcome: Outcome::Refused,
                    standalone_query,
                    warning: None,
                });
            }
        };

        let mut variables = HashMap::new();
        variables.insert(
            "transcript".to_string(),
            format_transcript(&request.chat_history),
        );
        variables.insert("domain".to_string(), self.scope.name().to_string());
        variables.insert("topics".to_string(), self.scope.topics_phrase());
        variables.insert("refusal".to_string(), self.scope.out_of_scope_phrase());
        variables.insert("context".to_string(), context.text());
        variables.insert("question".to_string(), request.query_text.clone());
        let prompt = build_prompt(&self.answer_prompt, variables)?;

        let answer = self
            .generator
            .generate(&prompt.text, request.provider)
            .await?;

        let mut saved_user_docs = false;
        let mut warning = None;
        if request.save && !uploads.is_empty() {
            match self.save_uploads(&uploads).await {
                Ok(count) => {
                    tracing::info!("Saved {} uploaded documents", count);
                    saved_user_docs = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save uploaded documents");
                    warning = Some(format!("Uploaded documents were not saved: {}", e));
                }
            }
        }
        transition(RequestState::Answered);

        Ok(RagResponse {
            answer,
            context: context.parts,
            used_user_docs: !uploads.is_empty(),
            saved_user_docs,
            outcome: Outcome::Answered,
            standalone_query,
            warning,
        })
    }

    async fn save_uploads(&self, uploads: &[(&Upload, String)]) -> AppResult<usize> {
        let texts = uploads.iter().map(|(_, text)| text.clone()).collect();
        let metadatas = uploads
            .iter()
            .map(|(upload, _)| {
                let mut metadata = Metadata::new();
                metadata.insert(SOURCE_KEY.to_string(), USER_UPLOAD_SOURCE.to_string());
                metadata.insert("name".to_string(), upload.name.clone());
                metadata
            })
            .collect();

        self.store.add(texts, None, Some(metadatas)).await
    }

    /// Add base documents as-is, one record per text.
    pub async fn update_base_vectors(&self, docs: Vec<String>) -> AppResult<usize> {
        self.store.add(docs, None, None).await
    }

    pub async fn list_vectors(&self) -> AppResult<Vec<VectorEntry>> {
        Ok(self
            .store
            .list_all()
            .await?
            .into_iter()
            .map(|d| VectorEntry {
                id: d.id,
                text: d.text,
            })
            .collect())
    }

    pub async fn delete_vector(&self, id: &str) -> AppResult<bool> {
        self.store.delete(id).await
    }

    pub async fn upsert_vector(
        &self,
        text: String,
        id: Option<String>,
        metadata: Option<Metadata>,
    ) -> AppResult<String> {
        self.store.upsert(text, id, metadata).await
    }
}

fn transition(state: RequestState) {
    tracing::info!(state = %state, "Request state");
}
