//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use polystat_core::error::AnalyticsError;
use polystat_import::ImportError;
use tracing::{error, warn};

/// Any error a route can return, rendered as `{"error", "code", "kind"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Rejected or failed by the engine.
    Analytics(AnalyticsError),
    /// Rejected or failed by the importer.
    Import(ImportError),
    /// A required query parameter is absent.
    MissingParameter(&'static str),
    /// The query string could not be decoded.
    BadRequest(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Analytics(err) => err.status_code(),
            Self::Import(err) => err.status_code(),
            Self::MissingParameter(_) | Self::BadRequest(_) => 400,
        }
    }

    /// Returns a stable machine-readable name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analytics(err) => err.kind(),
            Self::Import(err) => err.kind(),
            Self::MissingParameter(_) => "missing_parameter",
            Self::BadRequest(_) => "bad_request",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Analytics(err) => err.to_string(),
            Self::Import(err) => err.to_string(),
            Self::MissingParameter(name) => format!("Missing required parameter '{name}'"),
            Self::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let message = self.message();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(kind = self.kind(), error = %message, "request failed");
        } else {
            warn!(kind = self.kind(), error = %message, "request rejected");
        }

        let body = serde_json::json!({
            "error": message,
            "code": code,
            "kind": self.kind(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        ApiError::Analytics(err)
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::Import(err)
    }
}
