//! Error types for haisha

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Input table could not be mapped onto the internal schema.
///
/// Always fatal: raised before any allocation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{table}: no column found for '{field}' (accepted headers: {accepted})")]
    MissingColumn {
        table: String,
        field: String,
        accepted: String,
    },

    #[error("{table}: header row is missing")]
    NoHeader { table: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to load input table: {0}")]
    InputLoad(String),

    #[error("Ledger is locked or cannot be opened for writing: {0}")]
    LedgerWriteConflict(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Excel export error: {0}")]
    Excel(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Run failed: {0}")]
    RunFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
