//! Error handling module for the attendance backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::export::ExportError;
use crate::roster::RosterError;
use crate::session::AuthFailure;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const ROSTER_NOT_LOADED: &str = "ROSTER_NOT_LOADED";
    pub const SESSION_CHANGED: &str = "SESSION_CHANGED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const EMPTY_EXPORT: &str = "EMPTY_EXPORT";
    pub const EXPORT_ERROR: &str = "EXPORT_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No authenticated session
    Unauthorized(String),
    /// Rejected by the identity provider; `code` is the provider's code
    AuthFailed { code: String, message: String },
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// The roster has not been loaded for the current session
    RosterNotLoaded,
    /// The session changed while the request was in flight
    SessionChanged,
    /// The student store failed
    Storage(String),
    /// Nothing to export
    EmptyExport(String),
    /// Spreadsheet encoding failed
    Export(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthFailed { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RosterNotLoaded => StatusCode::CONFLICT,
            AppError::SessionChanged => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::EmptyExport(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::AuthFailed { .. } => codes::AUTH_FAILED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::RosterNotLoaded => codes::ROSTER_NOT_LOADED,
            AppError::SessionChanged => codes::SESSION_CHANGED,
            AppError::Storage(_) => codes::STORAGE_ERROR,
            AppError::EmptyExport(_) => codes::EMPTY_EXPORT,
            AppError::Export(_) => codes::EXPORT_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::AuthFailed { message, .. } => message.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::RosterNotLoaded => RosterError::NotLoaded.to_string(),
            AppError::SessionChanged => RosterError::SessionChanged.to_string(),
            AppError::Storage(msg) => msg.clone(),
            AppError::EmptyExport(msg) => msg.clone(),
            AppError::Export(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::Validation(msg) => AppError::Validation(msg),
            RosterError::NotLoaded => AppError::RosterNotLoaded,
            e @ RosterError::NotFound(_) => AppError::NotFound(e.to_string()),
            RosterError::Storage(failure) => AppError::Storage(failure.message),
            RosterError::SessionChanged => AppError::SessionChanged,
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(err: AuthFailure) -> Self {
        match err {
            AuthFailure::Validation(msg) => AppError::Validation(msg),
            AuthFailure::Rejected { code, reason } => AppError::AuthFailed {
                code,
                message: reason,
            },
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Empty => AppError::EmptyExport(err.to_string()),
            other => {
                tracing::error!("Export error: {:?}", other);
                AppError::Export(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::Validation(rejection.body_text())
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::AuthFailed { code, .. } => Some(serde_json::json!({ "authCode": code })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
