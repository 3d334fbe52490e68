//! Consult Core Library
//!
//! This crate provides the foundational utilities shared by every Consult crate:
//! - Error taxonomy (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Layered configuration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
