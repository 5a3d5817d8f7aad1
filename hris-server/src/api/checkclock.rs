//! Check-clock setting endpoints (HR only)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{CheckclockSetting, CheckclockSettingCreate, CheckclockSettingUpdate};
use shared::{ApiResponse, PageQuery, Paginated};

use crate::state::AppState;

use super::ApiResult;

pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<CheckclockSetting>> {
    Ok(ApiResponse::success(state.checkclock.list(&page).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<CheckclockSetting> {
    Ok(ApiResponse::success(state.checkclock.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CheckclockSettingCreate>,
) -> ApiResult<CheckclockSetting> {
    Ok(ApiResponse::success(state.checkclock.create(req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CheckclockSettingUpdate>,
) -> ApiResult<CheckclockSetting> {
    Ok(ApiResponse::success(state.checkclock.update(id, req).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.checkclock.delete(id).await?;
    Ok(ApiResponse::message("Check-clock setting deleted"))
}
