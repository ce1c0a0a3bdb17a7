//! Import error types.

use polystat_core::error::AnalyticsError;
use thiserror::Error;

/// Errors raised while importing a payload.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The format is neither CSV nor JSON.
    #[error("Unsupported import format '{0}'. Must be one of: csv, json")]
    UnsupportedFormat(String),

    /// The CSV payload could not be read.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The JSON payload is not an array of objects.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A record is missing a required field or holds an uncoercible value.
    /// `record` is 1-based.
    #[error("Record {record}: field '{field}' {reason}")]
    InvalidRecord {
        record: usize,
        field: String,
        reason: String,
    },

    /// The import file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine or storage rejected the import.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

impl ImportError {
    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedFormat(_)
            | Self::Csv(_)
            | Self::Json(_)
            | Self::InvalidRecord { .. } => 400,
            Self::Io(_) => 500,
            Self::Analytics(err) => err.status_code(),
        }
    }

    /// Returns a stable machine-readable name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Csv(_) => "invalid_csv",
            Self::Json(_) => "invalid_json",
            Self::InvalidRecord { .. } => "invalid_record",
            Self::Io(_) => "io_error",
            Self::Analytics(err) => err.kind(),
        }
    }
}
