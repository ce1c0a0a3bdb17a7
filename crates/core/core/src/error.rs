//! Error types for Polystat.
//!
//! This module defines the `AnalyticsError` enum which represents every
//! failure the engine can report, together with the classification the
//! HTTP layer uses to choose a status code.

use thiserror::Error;

/// Coarse error class used by transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request carried a parameter the engine cannot accept.
    InvalidParameter,
    /// The request named something that does not exist.
    NotFound,
    /// The engine or its storage failed.
    Internal,
}

/// The main error type for Polystat operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    // ==================== Lookup Errors ====================
    /// The analytics type has no registry entry.
    #[error("Unknown analytics type '{value}'. Must be one of: {}", .allowed.join(", "))]
    UnknownAnalyticsType { value: String, allowed: Vec<String> },

    // ==================== Validation Errors ====================
    /// A field is not permitted in the requested role.
    #[error("Invalid {role} field '{field}' for {analytics_type}. Must be one of: {}", .allowed.join(", "))]
    InvalidField {
        analytics_type: String,
        field: String,
        role: String,
        allowed: Vec<String>,
    },

    /// A filter key is not supported by the analytics type.
    #[error("Invalid filter key '{key}' for {analytics_type}. Must be one of: {}", .allowed.join(", "))]
    InvalidFilterKey {
        analytics_type: String,
        key: String,
        allowed: Vec<String>,
    },

    /// A filter value cannot be compared against its field.
    #[error("Invalid value '{value}' for filter '{key}': {reason}")]
    InvalidFilterValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A date value matched none of the accepted formats.
    #[error("Unable to parse date: {value}")]
    UnparseableDate { value: String },

    /// The aggregation verb is unknown or cannot be applied to the field.
    #[error("Aggregation error: {message}")]
    AggregationError { message: String },

    /// A chart was requested from an ungrouped aggregation.
    #[error("Chart data requires a group_by field")]
    ChartRequiresGrouping,

    /// The chart type is not one of bar, line or pie.
    #[error("Invalid chart type '{value}'. Must be one of: bar, line, pie")]
    InvalidChartType { value: String },

    // ==================== Storage Errors ====================
    /// The storage backend failed.
    #[error("Storage error: {message}")]
    StorageError { message: String },

    // ==================== Configuration Errors ====================
    /// A domain configuration is inconsistent with its entity.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    // ==================== Internal Errors ====================
    /// An internal error occurred.
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl AnalyticsError {
    /// Creates a new storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// Creates a new aggregation error.
    pub fn aggregation(message: impl Into<String>) -> Self {
        Self::AggregationError {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Creates an unparseable date error.
    pub fn unparseable_date(value: impl Into<String>) -> Self {
        Self::UnparseableDate {
            value: value.into(),
        }
    }

    /// Returns the class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownAnalyticsType { .. } => ErrorClass::NotFound,
            Self::InvalidField { .. }
            | Self::InvalidFilterKey { .. }
            | Self::InvalidFilterValue { .. }
            | Self::UnparseableDate { .. }
            | Self::AggregationError { .. }
            | Self::ChartRequiresGrouping
            | Self::InvalidChartType { .. } => ErrorClass::InvalidParameter,
            Self::StorageError { .. }
            | Self::ConfigurationError { .. }
            | Self::InternalError { .. }
            | Self::SerializationError { .. } => ErrorClass::Internal,
        }
    }

    /// Returns true if the caller can fix this error by correcting the request.
    pub fn is_user_error(&self) -> bool {
        self.class() != ErrorClass::Internal
    }

    /// Returns a stable machine-readable name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAnalyticsType { .. } => "unknown_analytics_type",
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidFilterKey { .. } => "invalid_filter_key",
            Self::InvalidFilterValue { .. } => "invalid_filter_value",
            Self::UnparseableDate { .. } => "unparseable_date",
            Self::AggregationError { .. } => "aggregation_error",
            Self::ChartRequiresGrouping => "chart_requires_grouping",
            Self::InvalidChartType { .. } => "invalid_chart_type",
            Self::StorageError { .. } => "storage_error",
            Self::ConfigurationError { .. } => "configuration_error",
            Self::InternalError { .. } => "internal_error",
            Self::SerializationError { .. } => "serialization_error",
        }
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::InvalidParameter => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::Internal => 500,
        }
    }
}

/// A Result type alias using AnalyticsError.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
        }
    }
}
