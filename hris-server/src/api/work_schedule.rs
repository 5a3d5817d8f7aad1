//! Work schedule endpoints (HR only)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{WorkScheduleCreate, WorkScheduleFilter, WorkScheduleResponse, WorkScheduleUpdate};
use shared::{ApiResponse, PageQuery, Paginated};

use crate::state::AppState;

use super::ApiResult;

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<WorkScheduleFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<WorkScheduleResponse>> {
    Ok(ApiResponse::success(
        state.work_schedules.list(&filter, &page).await?,
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<WorkScheduleResponse> {
    Ok(ApiResponse::success(state.work_schedules.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<WorkScheduleCreate>,
) -> ApiResult<WorkScheduleResponse> {
    let schedule = state.work_schedules.create(req).await?;
    Ok(ApiResponse::success_with_message("Work schedule created", schedule))
}

/// PUT /v1/api/work-schedules/{id}: details with an `id` are updated, the rest inserted
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<WorkScheduleUpdate>,
) -> ApiResult<WorkScheduleResponse> {
    Ok(ApiResponse::success(
        state.work_schedules.update(id, req).await?,
    ))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.work_schedules.delete(id).await?;
    Ok(ApiResponse::message("Work schedule deleted"))
}
