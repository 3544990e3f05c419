//! Error types for the citeharvest core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the metadata service, the search index, configuration, and
//! report serialization.

use std::path::PathBuf;

/// Top-level error type for the citeharvest core library.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the bibliographic metadata service.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Failed to create HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("Metadata request failed: {message}")]
    Request { message: String },

    #[error("Metadata service returned status {status}")]
    Status { status: u16 },

    #[error("Metadata response parse error: {message}")]
    ResponseParse { message: String },
}

/// Errors from the citation search index.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Failed to create HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("Search request failed: {message}")]
    Request { message: String },

    /// `message` is the provider's own `error` text, when the body carried one.
    #[error("Search service returned status {status}{}", provider_detail(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Search response parse error: {message}")]
    ResponseParse { message: String },
}

fn provider_detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from writing the CSV report or the run summary.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A type alias for results using the top-level `HarvestError`.
pub type Result<T> = std::result::Result<T, HarvestError>;
