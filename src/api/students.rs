//! Student API endpoints.

use axum::extract::{Path, State};

use super::{notify_failure, success_with_message, view::current_view, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{AddHoursRequest, CreateStudentRequest, StudentRecord, StudentView};
use crate::AppState;

/// GET /api/students - The filtered and sorted table.
pub async fn list_students(State(state): State<AppState>) -> ApiResult<StudentView> {
    current_view(&state).await
}

/// POST /api/students - Add a student to the roster.
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<ApiJson<CreateStudentRequest>, AppError>,
) -> ApiResult<StudentRecord> {
    let ApiJson(request) = payload.map_err(|e| notify_failure(&state.notifier, e))?;

    let record = state
        .roster
        .add(request)
        .await
        .map_err(|e| notify_failure(&state.notifier, e))?;

    success_with_message(&state.notifier, record, "Student added successfully!")
}

/// POST /api/students/:id/hours - Add attended hours to a student.
pub async fn add_hours(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<ApiJson<AddHoursRequest>, AppError>,
) -> ApiResult<StudentRecord> {
    let ApiJson(request) = payload.map_err(|e| notify_failure(&state.notifier, e))?;

    let update = state
        .roster
        .increment_hours(&id, &request.hours)
        .await
        .map_err(|e| notify_failure(&state.notifier, e))?;

    let message = format!("Added {} hours successfully", update.added);
    success_with_message(&state.notifier, update.record, message)
}
