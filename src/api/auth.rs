//! Account and session endpoints.

use axum::extract::State;
use serde::Serialize;

use super::{notify_failure, success, success_with_message, ApiJson, ApiResult};
use crate::models::{Identity, LoginRequest, RegisterRequest, Session};
use crate::AppState;

/// Session state plus whether the roster has finished loading for it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session: Session,
    pub roster_loaded: bool,
}

/// POST /api/auth/register - Create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<Identity> {
    let identity = state.session.register(&request).await?;
    success_with_message(&state.notifier, identity, "Account created successfully!")
}

/// POST /api/auth/login - Sign in with email and password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Identity> {
    let identity = state.session.authenticate(&request).await?;
    success_with_message(&state.notifier, identity, "Login successful!")
}

/// POST /api/auth/logout - End the current session.
pub async fn logout(State(state): State<AppState>) -> ApiResult<Session> {
    state
        .session
        .deauthenticate()
        .await
        .map_err(|e| notify_failure(&state.notifier, e))?;

    success_with_message(
        &state.notifier,
        state.session.current(),
        "Logged out successfully!",
    )
}

/// GET /api/auth/session - Current session.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionStatus> {
    let session = state.session.current();
    let roster_loaded = match session.identity() {
        Some(identity) => state.roster.is_loaded_for(&identity.uid).await,
        None => false,
    };

    success(SessionStatus {
        session,
        roster_loaded,
    })
}
