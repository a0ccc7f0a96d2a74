//! Banner endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::notify::Notification;
use crate::AppState;

/// GET /api/notification - The banner currently showing, if any.
pub async fn get_notification(State(state): State<AppState>) -> ApiResult<Option<Notification>> {
    success(state.notifier.current())
}
