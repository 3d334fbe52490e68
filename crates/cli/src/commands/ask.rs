//! Ask command handler.
//!
//! Sends one question through the query pipeline, with optional attached
//! files and prior conversation.

use super::{print_json, Services};
use clap::Args;
use consult_core::{config::AppConfig, AppError, AppResult};
use consult_knowledge::{ChatMessage, RagRequest, Upload};
use consult_llm::Provider;
use std::path::{Path, PathBuf};

/// Ask the consultant a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Attach a document to this question (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Use attached documents without saving them to the store
    #[arg(long)]
    pub no_save: bool,

    /// Prior conversation: a JSON file or inline JSON array of
    /// {"sender": "user"|"assistant", "content": "..."}
    #[arg(long)]
    pub history: Option<String>,

    /// Number of documents to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Generation slot to use
    #[arg(short, long, default_value = "primary", value_parser = parse_provider)]
    pub provider: Provider,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let services = Services::build(config)?;
        let rag = services.orchestrator(config)?;

        let mut request = RagRequest::new(self.question.clone())
            .with_save(!self.no_save)
            .with_provider(self.provider)
            .with_history(match &self.history {
                Some(raw) => parse_history(raw),
                None => Vec::new(),
            });

        if let Some(top_k) = self.top_k {
            request = request.with_top_k(top_k);
        }

        for path in &self.files {
            request = request.with_upload(read_upload(path)?);
        }

        let response = rag.answer(request).await?;

        if self.json {
            print_json(&response)?;
        } else {
            println!("{}", response.answer);

            if let Some(warning) = &response.warning {
                eprintln!("Warning: {}", warning);
            }
            tracing::debug!(
                outcome = ?response.outcome,
                standalone_query = %response.standalone_query,
                context_parts = response.context.len(),
                saved_user_docs = response.saved_user_docs,
                "Answer details"
            );
        }

        Ok(())
    }
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    Provider::parse(s).ok_or_else(|| format!("unknown provider slot '{}' (primary, secondary)", s))
}

/// Read history from a file path or inline JSON.
///
/// Malformed history is treated as no history.
fn parse_history(raw: &str) -> Vec<ChatMessage> {
    let path = Path::new(raw);
    let json = if path.is_file() {
        match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read history file {:?}: {}", path, e);
                return Vec::new();
            }
        }
    } else {
        raw.to_string()
    };

    serde_json::from_str(&json).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed chat history: {}", e);
        Vec::new()
    })
}

fn read_upload(path: &Path) -> AppResult<Upload> {
    let bytes = std::fs::read(path).map_err(|e| {
        AppError::InvalidArgument(format!("Cannot read attached file {:?}: {}", path, e))
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Upload::new(name, bytes))
}
