//! Ingestion: raw texts and files into the vector store.

use crate::chunker::chunk_text;
use crate::parser::{PlainTextExtractor, TextExtractor};
use crate::store::VectorStore;
use crate::types::{default_metadata, IngestStats, Metadata, SOURCE_KEY};
use consult_core::{AppConfig, AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Metadata key holding a chunk's position within its source.
pub const CHUNK_KEY: &str = "chunk";

/// Metadata key holding the sha256 hex digest of a chunk's text.
pub const CONTENT_HASH_KEY: &str = "content_hash";

/// One text to ingest.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub text: String,

    /// Base id; chunks are stored as `{id}:{n}`
    pub id: Option<String>,

    pub metadata: Option<Metadata>,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Chunks texts and writes them to a [`VectorStore`].
pub struct Ingestor {
    store: Arc<VectorStore>,
    extractor: Arc<dyn TextExtractor>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Ingestor {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self {
            store,
            extractor: Arc::new(PlainTextExtractor),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn from_config(config: &AppConfig, store: Arc<VectorStore>) -> Self {
        Self::new(store).with_chunking(config.ingest.chunk_size, config.ingest.chunk_overlap)
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Replace the built-in plain-text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Chunk raw texts and add every chunk in one store write.
    ///
    /// Each chunk inherits its input's metadata (default `{"source":
    /// "default"}`) plus `chunk` and `content_hash`.
    pub async fn ingest_texts(&self, inputs: Vec<TextInput>) -> AppResult<IngestStats> {
        let mut stats = IngestStats::default();
        let mut texts = Vec::new();
        let mut ids = Vec::new();
        let mut metadatas = Vec::new();

        for input in inputs {
            stats.sources_count += 1;
            stats.bytes_processed += input.text.len() as u64;

            let base_metadata = input.metadata.unwrap_or_else(default_metadata);

            for candidate in chunk_text(&input.text, self.chunk_size, self.chunk_overlap) {
                let mut metadata = base_metadata.clone();
                metadata.insert(CHUNK_KEY.to_string(), candidate.position.to_string());
                metadata.insert(CONTENT_HASH_KEY.to_string(), content_hash(&candidate.text));

                ids.push(match &input.id {
                    Some(id) => format!("{}:{}", id, candidate.position),
                    None => uuid::Uuid::new_v4().to_string(),
                });
                texts.push(candidate.text);
                metadatas.push(metadata);
            }
        }

        stats.chunks_count = self.store.add(texts, Some(ids), Some(metadatas)).await? as u32;

        tracing::info!(
            "Ingested {} sources into {} chunks",
            stats.sources_count,
            stats.chunks_count
        );

        Ok(stats)
    }

    /// Extract, chunk and add files.
    ///
    /// Directories are walked recursively and files with unsupported formats
    /// inside them are skipped. A file named explicitly must be supported.
    pub async fn ingest_paths(&self, paths: &[PathBuf]) -> AppResult<IngestStats> {
        let start = Instant::now();
        let mut files = Vec::new();
        let mut skipped = 0u32;

        for path in paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                for entry in WalkDir::new(path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                {
                    let entry_path = entry.path();
                    if !entry_path.is_file() {
                        continue;
                    }
                    if self.extractor.supports(entry_path) {
                        files.push(entry_path.to_path_buf());
                    } else {
                        tracing::debug!("Skipping unsupported file: {:?}", entry_path);
                        skipped += 1;
                    }
                }
            } else {
                return Err(AppError::InvalidArgument(format!(
                    "Path does not exist: {}",
                    path.display()
                )));
            }
        }

        let mut inputs = Vec::with_capacity(files.len());
        for file in &files {
            tracing::debug!("Extracting text from {:?}", file);
            let text = self.extractor.extract_text(file)?;
            inputs.push(TextInput::new(text).with_metadata(file_metadata(file)));
        }

        let mut stats = self.ingest_texts(inputs).await?;
        stats.skipped_count = skipped;

        tracing::info!(
            "Ingest completed: {} files, {} chunks, {} skipped, {} bytes in {:.2}s",
            stats.sources_count,
            stats.chunks_count,
            stats.skipped_count,
            stats.bytes_processed,
            start.elapsed().as_secs_f64()
        );

        Ok(stats)
    }
}

fn file_metadata(path: &Path) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), path.display().to_string());
    if let Some(name) = path.file_name() {
        metadata.insert("name".to_string(), name.to_string_lossy().into_owned());
    }
    metadata
}

/// Hex sha256 of a chunk's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
