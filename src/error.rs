//! Error types for parsegen
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in parsegen
#[derive(Debug, Error)]
pub enum ParsegenError {
    /// Table could not be read, typed or written
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Startup configuration error (credentials, interpreter, config file)
    #[error("Config error: {0}")]
    Config(String),

    /// Artifact persistence error
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for parsegen operations
pub type Result<T> = std::result::Result<T, ParsegenError>;
