//! LLM provider factory.
//!
//! Builds clients from application configuration, resolving endpoints and
//! API keys.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use consult_core::config::ProviderConfig;
use consult_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client for a provider type.
///
/// # Errors
/// - `Config` if the provider has no (or a mismatched) configuration entry
/// - `GenerationUnavailable` if a required API key is missing
pub fn create_client(provider: ProviderType, config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider_config = config.get_provider_config(provider.as_str()).ok_or_else(|| {
        AppError::Config(format!("No configuration for provider '{}'", provider.as_str()))
    })?;

    match (provider, provider_config) {
        (ProviderType::Ollama, ProviderConfig::Ollama { endpoint, timeout, .. }) => {
            let client = match timeout {
                Some(secs) => OllamaClient::with_timeout(endpoint.as_str(), *secs)?,
                None => OllamaClient::with_base_url(endpoint.as_str()),
            };
            Ok(Arc::new(client))
        }
        (ProviderType::Gemini, ProviderConfig::Gemini { api_key_env, endpoint, .. }) => {
            let api_key = config.resolve_api_key(provider.as_str()).ok_or_else(|| {
                AppError::GenerationUnavailable(format!(
                    "Gemini provider requires an API key in {}",
                    api_key_env
                ))
            })?;
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(api_key, url.as_str()),
                None => GeminiClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
        (provider, _) => Err(AppError::Config(format!(
            "Configuration for '{}' has the wrong shape",
            provider.as_str()
        ))),
    }
}
