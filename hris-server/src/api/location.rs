//! Location endpoints (HR only)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Location, LocationCreate, LocationUpdate};
use shared::{ApiResponse, PageQuery, Paginated};

use crate::state::AppState;

use super::ApiResult;

pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<Location>> {
    Ok(ApiResponse::success(state.locations.list(&page).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Location> {
    Ok(ApiResponse::success(state.locations.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<LocationCreate>,
) -> ApiResult<Location> {
    Ok(ApiResponse::success(state.locations.create(req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<LocationUpdate>,
) -> ApiResult<Location> {
    Ok(ApiResponse::success(state.locations.update(id, req).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.locations.delete(id).await?;
    Ok(ApiResponse::message("Location deleted"))
}
