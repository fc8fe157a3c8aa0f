//! Error types for the core crate

/// Errors raised while loading or querying a dataset
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Error reading CSV: {0}")]
    Csv(String),

    #[error("Error reading Excel file: {0}")]
    Excel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{0}' is not numeric")]
    NonNumericColumn(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("GEMINI_API_KEY is required. Please set it in .env file.")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, DataError>;
