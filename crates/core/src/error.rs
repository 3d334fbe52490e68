//! Error types for Consult.
//!
//! One enum covers the whole pipeline. The dependency-outage variants
//! (`ModelUnavailable`, `StoreUnavailable`, `GenerationUnavailable`) are kept
//! distinct so the boundary layer can map each to its own user-visible message.

use thiserror::Error;

/// Unified error type for Consult.
///
/// Library code returns `Result<T, AppError>` and never panics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request data; the request fails fast.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding model could not be loaded or reached.
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// The vector store is unopened, corrupted or otherwise unusable.
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// The selected generation provider is unreachable or unconfigured.
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether this error comes from an external dependency outage
    /// rather than from the caller's input.
    pub fn is_dependency_outage(&self) -> bool {
        matches!(
            self,
            AppError::ModelUnavailable(_)
                | AppError::StoreUnavailable(_)
                | AppError::GenerationUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
