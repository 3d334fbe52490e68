//! Ingest command handler.

use super::{print_json, Services};
use clap::Args;
use consult_core::{config::AppConfig, AppResult};
use consult_knowledge::Ingestor;
use std::path::PathBuf;
use std::time::Instant;

/// Add files or directories to the document store
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories (.txt, .md, .json)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {} paths", self.paths.len());

        let start = Instant::now();
        let services = Services::build(config)?;
        let ingestor = Ingestor::from_config(config, services.store.clone());

        let stats = ingestor.ingest_paths(&self.paths).await?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Ingested {} sources ({} chunks, {} bytes, {} skipped) in {:.2}s",
                stats.sources_count,
                stats.chunks_count,
                stats.bytes_processed,
                stats.skipped_count,
                start.elapsed().as_secs_f64()
            );
        }

        Ok(())
    }
}
