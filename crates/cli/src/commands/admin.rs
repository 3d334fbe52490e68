//! Admin command handler.
//!
//! Direct access to stored vectors, bypassing the question pipeline.

use super::{print_json, Services};
use clap::{Args, Subcommand};
use consult_core::{config::AppConfig, AppResult};

/// Inspect and edit stored vectors
#[derive(Args, Debug)]
pub struct AdminCommand {
    #[command(subcommand)]
    pub action: AdminAction,
}

#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Add base documents, one record per text
    UpdateVectors {
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// List stored documents
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a document by id
    Delete { id: String },

    /// Insert or replace a document
    Upsert {
        text: String,

        /// Document id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Show store statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl AdminCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing admin command");

        let services = Services::build(config)?;
        let rag = services.orchestrator(config)?;

        match &self.action {
            AdminAction::UpdateVectors { texts } => {
                let added = rag.update_base_vectors(texts.clone()).await?;
                println!("Added {} documents", added);
            }
            AdminAction::List { json } => {
                let entries = rag.list_vectors().await?;
                if *json {
                    print_json(&entries)?;
                } else if entries.is_empty() {
                    println!("Store is empty");
                } else {
                    for entry in &entries {
                        println!("{}\t{}", entry.id, preview(&entry.text, 80));
                    }
                }
            }
            AdminAction::Delete { id } => {
                if rag.delete_vector(id).await? {
                    println!("Deleted {}", id);
                } else {
                    println!("No document with id {}", id);
                }
            }
            AdminAction::Upsert { text, id } => {
                let id = rag.upsert_vector(text.clone(), id.clone(), None).await?;
                println!("Upserted {}", id);
            }
            AdminAction::Stats { json } => {
                let stats = services.store.stats().await?;
                if *json {
                    print_json(&stats)?;
                } else {
                    println!("Documents:  {}", stats.documents_count);
                    match stats.dimension {
                        Some(d) => println!("Dimension:  {}", d),
                        None => println!("Dimension:  (not set)"),
                    }
                    println!(
                        "Embedding:  {}/{}",
                        stats.embedding_provider, stats.embedding_model
                    );
                    println!("Size:       {} bytes", stats.db_size_bytes);
                }
            }
        }

        Ok(())
    }
}

/// First `max` characters on one line.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short\ntext", 80), "short text");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
