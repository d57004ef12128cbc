//! Error types for churn-flux

use thiserror::Error;

/// Errors that can occur while analyzing customer tables
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing required column '{column}' in {table} table")]
    MissingColumn { table: String, column: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to parse input table: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl AnalysisError {
    pub(crate) fn missing_column(table: &str, column: &str) -> Self {
        AnalysisError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
