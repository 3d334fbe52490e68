//! Document store and retrieval-augmented answering for Consult.
//!
//! Local-first: embeddings come from a pluggable provider and documents live
//! in a SQLite file under the workspace.
//!
//! # Example
//! ```no_run
//! use consult_core::AppConfig;
//! use consult_knowledge::{Embedder, RagOrchestrator, RagRequest, VectorStore};
//! use consult_llm::Generator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let embedder = Arc::new(Embedder::from_config(&config)?);
//! let store = Arc::new(VectorStore::open(&config, embedder)?);
//! let generator = Arc::new(Generator::from_config(&config));
//!
//! let rag = RagOrchestrator::from_config(&config, store, generator)?;
//! let response = rag.answer(RagRequest::new("What is a franchise fee?")).await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod parser;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use embeddings::{Embedder, EmbeddingProvider};
pub use index::SqliteIndex;
pub use ingest::{Ingestor, TextInput};
pub use parser::{PlainTextExtractor, TextExtractor};
pub use rag::{
    ChatMessage, Outcome, RagOrchestrator, RagRequest, RagResponse, Sender, Upload, VectorEntry,
};
pub use store::VectorStore;
pub use types::{Document, IngestStats, Metadata, RetrievalResult, StoreStats};
pub use vector_index::VectorIndex;
