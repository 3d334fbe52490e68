//! Prompt system for Consult.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in definitions for query rewriting and answering
//! - Workspace overrides under `.consult/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, PromptLibrary};
pub use builtin::{ANSWER_PROMPT_ID, REWRITE_PROMPT_ID};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
