//! LLM integration crate for Consult.
//!
//! This crate provides the Generator abstraction: one interface over a closed
//! set of interchangeable backend providers, selected per call through the
//! PRIMARY/SECONDARY slot enum.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default primary)
//! - **Gemini**: Google Generative Language API (default secondary)
//!
//! # Example
//! ```no_run
//! use consult_llm::{Generator, Provider, providers::OllamaClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = Generator::new(Arc::new(OllamaClient::new()), "mistral");
//! let answer = generator.generate("Hello, world!", Provider::Primary).await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod generator;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use generator::{Generator, Slot};
pub use providers::{GeminiClient, OllamaClient};
pub use types::{GenerationOptions, Provider, ProviderType};
