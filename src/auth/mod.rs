//! Session gate for the student endpoints.
//!
//! Requests pass only while the process holds an authenticated session.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::AppState;

pub const LOGIN_REQUIRED: &str = "Please log in to continue";

/// Reject the request with 401 unless someone is logged in, and with 409
/// until that user's roster has been loaded.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(identity) = state.session.current().identity().cloned() else {
        tracing::debug!(path = %request.uri().path(), "Rejected anonymous request");
        return AppError::Unauthorized(LOGIN_REQUIRED.to_string()).into_response();
    };

    if !state.roster.is_loaded_for(&identity.uid).await {
        return AppError::RosterNotLoaded.into_response();
    }

    next.run(request).await
}
