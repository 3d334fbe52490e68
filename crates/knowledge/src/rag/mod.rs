//! Retrieval-augmented answering.
//!
//! The orchestrator composes query rewriting, retrieval, the context
//! guardrail and generation, and optionally persists uploaded documents.

pub mod guardrail;
pub mod orchestrator;
pub mod retriever;
pub mod rewrite;
pub mod types;

pub use guardrail::{Context, Decision, DomainScope, GuardrailPolicy};
pub use orchestrator::{RagOrchestrator, DEFAULT_TOP_K, USER_UPLOAD_SOURCE};
pub use retriever::Retriever;
pub use rewrite::{QueryRewriter, Rewrite};
pub use types::{
    ChatMessage, Outcome, RagRequest, RagResponse, RequestState, Sender, Upload, VectorEntry,
};
