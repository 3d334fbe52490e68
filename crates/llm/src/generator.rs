//! Slot-based text generation.
//!
//! A [`Generator`] holds one backend per [`Provider`] slot. Slots whose
//! backend could not be built at startup stay [`Slot::Unconfigured`] and
//! fail with `GenerationUnavailable` when selected.

use crate::client::{LlmClient, LlmRequest};
use crate::factory::create_client;
use crate::types::{GenerationOptions, Provider, ProviderType};
use consult_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Backend bound to a slot.
#[derive(Clone)]
pub enum Slot {
    Ready {
        client: Arc<dyn LlmClient>,
        model: String,
    },
    Unconfigured(String),
}

impl Slot {
    /// Build a slot from a configured provider name.
    fn from_config(name: &str, config: &AppConfig) -> Self {
        let Some(provider) = ProviderType::parse(name) else {
            return Slot::Unconfigured(format!("unknown provider '{}'", name));
        };
        let Some(provider_config) = config.get_provider_config(provider.as_str()) else {
            return Slot::Unconfigured(format!("no configuration for '{}'", name));
        };

        match create_client(provider, config) {
            Ok(client) => Slot::Ready {
                client,
                model: provider_config.model().to_string(),
            },
            Err(e) => Slot::Unconfigured(e.to_string()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Slot::Ready { client, model } => format!("{}/{}", client.provider_name(), model),
            Slot::Unconfigured(reason) => format!("unconfigured ({})", reason),
        }
    }
}

/// Produces text from a prompt using the selected slot.
#[derive(Clone)]
pub struct Generator {
    primary: Slot,
    secondary: Slot,
    options: GenerationOptions,
}

impl Generator {
    /// Create a generator with only the primary slot bound.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            primary: Slot::Ready {
                client,
                model: model.into(),
            },
            secondary: Slot::Unconfigured("no secondary provider".to_string()),
            options: GenerationOptions::default(),
        }
    }

    /// Bind the secondary slot.
    pub fn with_secondary(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.secondary = Slot::Ready {
            client,
            model: model.into(),
        };
        self
    }

    /// Set the sampling options used for every call.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Build both slots from configuration.
    ///
    /// Never fails: a slot that cannot be built is recorded as unconfigured
    /// and reported when a request selects it.
    pub fn from_config(config: &AppConfig) -> Self {
        let primary = Slot::from_config(&config.llm.primary, config);
        let secondary = Slot::from_config(&config.llm.secondary, config);

        tracing::debug!(
            primary = %primary.describe(),
            secondary = %secondary.describe(),
            "Generator slots bound"
        );

        Self {
            primary,
            secondary,
            options: GenerationOptions::from(&config.generation),
        }
    }

    /// The slot behind a provider selector.
    pub fn slot(&self, provider: Provider) -> &Slot {
        match provider {
            Provider::Primary => &self.primary,
            Provider::Secondary => &self.secondary,
        }
    }

    /// Generate a completion for `prompt` with the selected slot.
    ///
    /// # Errors
    /// `GenerationUnavailable` if the slot is unconfigured or the backend
    /// call fails.
    pub async fn generate(&self, prompt: &str, provider: Provider) -> AppResult<String> {
        let (client, model) = match self.slot(provider) {
            Slot::Ready { client, model } => (client, model),
            Slot::Unconfigured(reason) => {
                return Err(AppError::GenerationUnavailable(format!(
                    "{} provider is not configured: {}",
                    provider, reason
                )))
            }
        };

        let request = LlmRequest::new(prompt, model.as_str()).with_options(self.options);

        let response = client.complete(&request).await?;

        tracing::debug!(
            slot = %provider,
            provider = client.provider_name(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Generation complete"
        );

        Ok(response.content)
    }
}
