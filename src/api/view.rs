//! Search and sort endpoints. Each returns the recomputed table.

use axum::extract::State;

use super::{success, ApiJson, ApiResult};
use crate::models::{SearchRequest, SortRequest, StudentView};
use crate::view::{self, toggle_sort};
use crate::AppState;

/// PUT /api/view/search - Set the search term.
pub async fn set_search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> ApiResult<StudentView> {
    state.view.write().await.search = request.term;
    current_view(&state).await
}

/// DELETE /api/view/search - Clear the search term.
pub async fn clear_search(State(state): State<AppState>) -> ApiResult<StudentView> {
    state.view.write().await.search.clear();
    current_view(&state).await
}

/// POST /api/view/sort - Sort by a column, flipping direction on repeat.
pub async fn sort_by(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SortRequest>,
) -> ApiResult<StudentView> {
    {
        let mut view_state = state.view.write().await;
        view_state.sort = toggle_sort(view_state.sort, request.key);
    }
    current_view(&state).await
}

pub(super) async fn current_view(state: &AppState) -> ApiResult<StudentView> {
    let view_state = state.view.read().await.clone();
    let table = state
        .roster
        .with_records(|records| view::present(records, &view_state))
        .await?;
    success(table)
}
