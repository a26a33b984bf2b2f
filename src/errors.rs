use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{
    analysis_service::AnalysisError, export_service::ExportError, extract_service::ExtractError,
    graph_service::GraphError, report_service::StoreError,
};

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 422 Unprocessable Entity
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ReportNotFound(_) => AppError::not_found(err.to_string()),
            StoreError::InvalidFilename { .. } => AppError::bad_request(err.to_string()),
            StoreError::Sqlx(_) | StoreError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        // An unparseable upload is the caller's problem, not ours.
        AppError::unprocessable(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::unprocessable(err.to_string())
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::InvalidArchive(_) => AppError::unprocessable(err.to_string()),
            GraphError::Io(_) | GraphError::Bundle(_) => AppError::internal(err.to_string()),
        }
    }
}
