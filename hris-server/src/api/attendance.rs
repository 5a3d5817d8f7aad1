//! Attendance endpoints

use axum::{
    Extension,
    extract::{Query, State},
};
use shared::models::{Attendance, AttendanceFilter};
use shared::{ApiResponse, PageQuery, Paginated};

use crate::auth::CurrentUser;
use crate::state::AppState;

use super::ApiResult;

/// GET /v1/api/attendances
///
/// Employees only ever see their own records.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(mut filter): Query<AttendanceFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<Attendance>> {
    if !user.is_admin() {
        let employee = state.leave_requests.employee_for_user(&user.id).await?;
        filter.employee_id = Some(employee.id);
    }
    Ok(ApiResponse::success(
        state.attendances.list(&filter, &page).await?,
    ))
}
