//! Core types for the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form string metadata attached to a document.
pub type Metadata = BTreeMap<String, String>;

/// Metadata key naming where a document came from.
pub const SOURCE_KEY: &str = "source";

/// Metadata applied when a caller supplies none.
pub fn default_metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), "default".to_string());
    metadata
}

/// A stored document with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier
    pub id: String,

    /// Document text
    pub text: String,

    /// Embedding vector (store dimension)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,

    pub metadata: Metadata,

    /// When this record was last written
    pub stored_at: DateTime<Utc>,
}

/// One nearest-neighbor hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    pub document_id: String,
    pub text: String,

    /// Cosine similarity; higher is more similar
    pub score: f32,

    pub metadata: Metadata,
}

/// A chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    /// Position of this chunk within its source text
    pub position: u32,

    pub text: String,

    /// Character offsets of the chunk within the source
    pub start: usize,
    pub end: usize,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestStats {
    /// Texts or files ingested
    pub sources_count: u32,

    /// Chunks written to the store
    pub chunks_count: u32,

    /// Files skipped because their format is unsupported
    pub skipped_count: u32,

    /// Bytes of extracted text
    pub bytes_processed: u64,
}

/// Snapshot of store state for the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents_count: usize,

    /// Embedding dimension recorded by the store, if any write happened
    pub dimension: Option<usize>,

    pub embedding_provider: String,
    pub embedding_model: String,

    /// Size of the database file in bytes
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metadata() {
        let metadata = default_metadata();
        assert_eq!(metadata.get("source").map(String::as_str), Some("default"));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn test_document_serialization_omits_empty_embedding() {
        let doc = Document {
            id: "d1".to_string(),
            text: "Franchise fees".to_string(),
            embedding: Vec::new(),
            metadata: default_metadata(),
            stored_at: Utc::now(),
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["metadata"]["source"], "default");
    }
}
