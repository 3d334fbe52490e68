//! Conversational query rewriting.
//!
//! A follow-up like "what about territory?" retrieves poorly on its own. With
//! prior turns available, the generator rewrites it into a standalone search
//! query first.

use crate::rag::types::{format_transcript, ChatMessage};
use consult_core::AppResult;
use consult_llm::{Generator, Provider};
use consult_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a rewrite attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// No history; the raw query is already standalone.
    Standalone(String),

    /// The generator produced a standalone query.
    Rewritten(String),

    /// Generation failed; retrieval uses the raw query.
    FellBack { original: String, reason: String },
}

impl Rewrite {
    /// The query to retrieve with.
    pub fn query(&self) -> &str {
        match self {
            Rewrite::Standalone(q) | Rewrite::Rewritten(q) => q,
            Rewrite::FellBack { original, .. } => original,
        }
    }

    pub fn into_query(self) -> String {
        match self {
            Rewrite::Standalone(q) | Rewrite::Rewritten(q) => q,
            Rewrite::FellBack { original, .. } => original,
        }
    }
}

pub struct QueryRewriter {
    generator: Arc<Generator>,
    prompt: PromptDefinition,
}

impl QueryRewriter {
    pub fn new(generator: Arc<Generator>, prompt: PromptDefinition) -> Self {
        Self { generator, prompt }
    }

    /// Rewrite `raw_query` into a standalone query given `history`.
    ///
    /// Never fails on generation problems: those produce [`Rewrite::FellBack`].
    /// Only a broken prompt template is an error.
    pub async fn rewrite(
        &self,
        raw_query: &str,
        history: &[ChatMessage],
        provider: Provider,
    ) -> AppResult<Rewrite> {
        if history.is_empty() {
            return Ok(Rewrite::Standalone(raw_query.to_string()));
        }

        let mut variables = HashMap::new();
        variables.insert("transcript".to_string(), format_transcript(history));
        variables.insert("question".to_string(), raw_query.to_string());
        let prompt = build_prompt(&self.prompt, variables)?;

        let rewrite = match self.generator.generate(&prompt.text, provider).await {
            Ok(output) => {
                let trimmed = output.trim();
                if trimmed.is_empty() {
                    fell_back(raw_query, "empty rewrite")
                } else {
                    Rewrite::Rewritten(trimmed.to_string())
                }
            }
            Err(e) => fell_back(raw_query, &e.to_string()),
        };

        match &rewrite {
            Rewrite::FellBack { reason, .. } => {
                tracing::warn!(reason = %reason, "Query rewrite failed, using raw query")
            }
            other => tracing::debug!(standalone = %other.query(), "Query rewritten"),
        }

        Ok(rewrite)
    }
}

fn fell_back(raw_query: &str, reason: &str) -> Rewrite {
    Rewrite::FellBack {
        original: raw_query.to_string(),
        reason: reason.to_string(),
    }
}
