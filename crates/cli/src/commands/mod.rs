//! Command handlers for the Consult CLI.
//!
//! Every command builds its dependencies through [`Services`], which plays
//! the composition root: one embedder, one store handle and one generator
//! per process, passed explicitly to whatever needs them.

pub mod admin;
pub mod ask;
pub mod ingest;

pub use admin::AdminCommand;
pub use ask::AskCommand;
pub use ingest::IngestCommand;

use consult_core::{config::AppConfig, AppResult};
use consult_knowledge::{Embedder, RagOrchestrator, VectorStore};
use consult_llm::Generator;
use std::sync::Arc;

/// Process-wide singletons.
pub struct Services {
    pub store: Arc<VectorStore>,
    pub generator: Arc<Generator>,
}

impl Services {
    pub fn build(config: &AppConfig) -> AppResult<Self> {
        let embedder = Arc::new(Embedder::from_config(config)?);
        let store = Arc::new(VectorStore::open(config, embedder)?);
        let generator = Arc::new(Generator::from_config(config));

        Ok(Self { store, generator })
    }

    pub fn orchestrator(&self, config: &AppConfig) -> AppResult<RagOrchestrator> {
        RagOrchestrator::from_config(config, self.store.clone(), self.generator.clone())
    }
}

/// Pretty-print a serializable value to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
