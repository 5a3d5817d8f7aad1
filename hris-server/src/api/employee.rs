//! Employee and position endpoints (HR only)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    Employee, EmployeeCreate, EmployeeFilter, EmployeeUpdate, Position, PositionCreate,
};
use shared::{ApiResponse, PageQuery, Paginated};

use crate::state::AppState;

use super::ApiResult;

/// GET /v1/api/employees
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<EmployeeFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<Employee>> {
    Ok(ApiResponse::success(
        state.employees.list(&filter, &page).await?,
    ))
}

/// GET /v1/api/employees/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Employee> {
    Ok(ApiResponse::success(state.employees.get(id).await?))
}

/// POST /v1/api/employees
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<EmployeeCreate>,
) -> ApiResult<Employee> {
    let employee = state.employees.create(req).await?;
    Ok(ApiResponse::success_with_message("Employee created", employee))
}

/// PUT /v1/api/employees/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EmployeeUpdate>,
) -> ApiResult<Employee> {
    Ok(ApiResponse::success(state.employees.update(id, req).await?))
}

/// DELETE /v1/api/employees/{id}: marks the employee inactive
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Employee> {
    let employee = state.employees.deactivate(id).await?;
    Ok(ApiResponse::success_with_message("Employee deactivated", employee))
}

/// GET /v1/api/positions
pub async fn list_positions(State(state): State<AppState>) -> ApiResult<Vec<Position>> {
    Ok(ApiResponse::success(state.employees.positions().await?))
}

/// POST /v1/api/positions
pub async fn create_position(
    State(state): State<AppState>,
    Json(req): Json<PositionCreate>,
) -> ApiResult<Position> {
    Ok(ApiResponse::success(
        state.employees.create_position(req).await?,
    ))
}
