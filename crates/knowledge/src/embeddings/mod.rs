//! Embedding engine.
//!
//! [`Embedder`] wraps one provider for the whole process and checks every
//! result against the configured dimension, so callers can rely on
//! `embed(texts)` returning exactly one vector of dimension D per input.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use consult_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Maps text to fixed-dimension vectors.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Build the embedder described by the application config.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedding_config = EmbeddingConfig::from(&config.embedding);

        tracing::debug!(
            provider = %embedding_config.provider,
            model = %embedding_config.model,
            dimensions = embedding_config.dimensions,
            "Creating embedding provider"
        );

        Ok(Self::new(create_provider(&embedding_config)?))
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed texts, one vector per input, in input order.
    ///
    /// # Errors
    /// `ModelUnavailable` if the provider fails or returns the wrong number
    /// or shape of vectors.
    pub async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.provider.embed_batch(texts).await.map_err(|e| match e {
            AppError::ModelUnavailable(_) => e,
            other => AppError::ModelUnavailable(other.to_string()),
        })?;

        if embeddings.len() != texts.len() {
            return Err(AppError::ModelUnavailable(format!(
                "Provider '{}' returned {} embeddings for {} texts",
                self.provider_name(),
                embeddings.len(),
                texts.len()
            )));
        }

        let expected = self.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(AppError::ModelUnavailable(format!(
                "Provider '{}' returned dimension {}, expected {}",
                self.provider_name(),
                bad.len(),
                expected
            )));
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            expected
        );

        Ok(embeddings)
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::ModelUnavailable("No embedding returned".to_string()))
    }
}
