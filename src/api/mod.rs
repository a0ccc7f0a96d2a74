//! REST API module.
//!
//! Every JSON endpoint answers with the same success or error envelope.

mod auth;
mod export;
mod notifications;
mod students;
mod view;

pub use auth::*;
pub use export::*;
pub use notifications::*;
pub use students::*;
pub use view::*;

use axum::{
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::notify::Notifier;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Create a successful API response that also posts a success banner.
pub fn success_with_message<T: Serialize>(
    notifier: &Notifier,
    data: T,
    message: impl Into<String>,
) -> ApiResult<T> {
    let message = message.into();
    notifier.success(message.clone());
    Ok(ApiResponse {
        success: true,
        data,
        message: Some(message),
    })
}

/// JSON request body whose rejections use the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Post the error's message as a banner and convert it for the response.
pub fn notify_failure(notifier: &Notifier, err: impl Into<AppError>) -> AppError {
    let err = err.into();
    notifier.error(err.message());
    err
}
