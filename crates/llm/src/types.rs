//! Provider selection and sampling option types.

use consult_core::config::GenerationSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation slot selected per call.
///
/// Each slot is bound to one backend at startup; call sites never pick a
/// backend by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Primary,
    Secondary,
}

impl Provider {
    /// Parse a slot name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Get the canonical slot name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
    Gemini,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
        }
    }
}

/// Sampling options passed to the backend on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Top-k sampling cutoff
    pub top_k: u32,

    /// Top-p nucleus sampling
    pub top_p: f32,

    /// Penalty for repeated tokens (ignored by backends without one)
    pub repeat_penalty: f32,

    /// Maximum tokens to generate; backend default when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
            repeat_penalty: 1.1,
            max_tokens: None,
        }
    }
}

impl From<&GenerationSettings> for GenerationOptions {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            repeat_penalty: settings.repeat_penalty,
            max_tokens: settings.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("Gemini"), Some(ProviderType::Gemini));
        assert_eq!(ProviderType::parse("google"), None);
        assert_eq!(ProviderType::parse("unknown"), None);
    }

    #[test]
    fn test_parser_matches_known_providers() {
        for name in consult_core::config::KNOWN_PROVIDERS {
            let parsed = ProviderType::parse(name).unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn test_provider_slot_parsing() {
        assert_eq!(Provider::parse("PRIMARY"), Some(Provider::Primary));
        assert_eq!(Provider::parse("secondary"), Some(Provider::Secondary));
        assert_eq!(Provider::parse("tertiary"), None);
        assert_eq!(Provider::default(), Provider::Primary);
    }

    #[test]
    fn test_default_options() {
        let options = GenerationOptions::default();
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.top_k, 40);
        assert_eq!(options.top_p, 0.9);
        assert_eq!(options.repeat_penalty, 1.1);
        assert_eq!(options.max_tokens, None);
    }

    #[test]
    fn test_options_from_settings() {
        let settings = GenerationSettings {
            temperature: 0.2,
            max_tokens: Some(256),
            ..Default::default()
        };
        let options = GenerationOptions::from(&settings);
        assert_eq!(options.temperature, 0.2);
        assert_eq!(options.max_tokens, Some(256));
        assert_eq!(options.top_k, 40);
    }
}
