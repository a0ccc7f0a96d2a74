//! Spreadsheet download endpoint.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use super::notify_failure;
use crate::errors::AppError;
use crate::export::{self, ExportFormat};
use crate::view;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

/// GET /api/export?format=xlsx|csv - Download the roster matching the current search.
///
/// Rows follow roster order, not the table's sort order.
pub async fn download_export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let term = state.view.read().await.search.clone();
    let format = query.format;
    let today = Utc::now().date_naive();

    let artifact = state
        .roster
        .with_records(|records| export::export(view::filter(records, &term), format, today))
        .await
        .map_err(|e| notify_failure(&state.notifier, e))?
        .map_err(|e| notify_failure(&state.notifier, e))?;

    tracing::info!(
        filename = %artifact.filename,
        bytes = artifact.bytes.len(),
        "Export downloaded"
    );
    state
        .notifier
        .success(format!("{} file downloaded successfully", format.label()));

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
