//! Leave request endpoints
//!
//! Create and update take `multipart/form-data`: text fields plus an optional
//! `file` (or `attachment`) part holding the supporting document.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use chrono::NaiveDate;
use shared::date::parse_date;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    LeaveRequestCreate, LeaveRequestFilter, LeaveRequestResponse, LeaveRequestUpdate,
    LeaveStatusUpdate, LeaveType,
};
use shared::{ApiResponse, PageQuery, Paginated};

use crate::auth::CurrentUser;
use crate::db::LeaveScope;
use crate::state::AppState;
use crate::storage::Attachment;

use super::ApiResult;

fn bad_multipart(e: impl std::fmt::Display) -> AppError {
    AppError::invalid_request(format!("Multipart error: {e}"))
}

/// Text fields and the optional file of a multipart leave form
#[derive(Debug, Default)]
struct LeaveForm {
    fields: HashMap<String, String>,
    file: Option<Attachment>,
}

impl LeaveForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" || name == "attachment" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?.to_vec();
                // Browsers send an empty part when no file was chosen
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.file = Some(Attachment {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            } else {
                let value = field.text().await.map_err(bad_multipart)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn date(&self, name: &str) -> Result<Option<NaiveDate>, AppError> {
        self.text(name).map(|v| parse_date(&v, name)).transpose()
    }

    fn leave_type(&self) -> Result<Option<LeaveType>, AppError> {
        self.text("leave_type")
            .map(|v| {
                LeaveType::parse(&v).ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::InvalidFormat,
                        format!("Unknown leave type: {v}"),
                    )
                    .with_detail("field", "leave_type")
                })
            })
            .transpose()
    }

    fn employee_id(&self) -> Result<Option<i64>, AppError> {
        self.text("employee_id")
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    AppError::with_message(ErrorCode::InvalidFormat, "employee_id must be a number")
                        .with_detail("field", "employee_id")
                })
            })
            .transpose()
    }

    fn into_create(
        self,
        employee_id: i64,
    ) -> Result<(LeaveRequestCreate, Option<Attachment>), AppError> {
        let leave_type = self
            .leave_type()?
            .ok_or_else(|| AppError::required("leave_type"))?;
        let start_date = self
            .date("start_date")?
            .ok_or_else(|| AppError::required("start_date"))?;
        let end_date = self
            .date("end_date")?
            .ok_or_else(|| AppError::required("end_date"))?;
        let input = LeaveRequestCreate {
            employee_id,
            leave_type,
            start_date,
            end_date,
            employee_note: self.text("employee_note"),
        };
        Ok((input, self.file))
    }
}

/// Employee id the caller acts for: admins name one, employees get their own
async fn acting_employee(
    state: &AppState,
    user: &CurrentUser,
    requested: Option<i64>,
) -> Result<i64, AppError> {
    if user.is_admin() {
        return match requested {
            Some(id) => Ok(id),
            None => Err(AppError::required("employee_id")),
        };
    }
    Ok(state.leave_requests.employee_for_user(&user.id).await?.id)
}

/// Load a request the caller may see: admins see all, employees their own
async fn visible(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
) -> Result<LeaveRequestResponse, AppError> {
    let request = state.leave_requests.get(id).await?;
    if !user.is_admin() {
        let employee = state.leave_requests.employee_for_user(&user.id).await?;
        if employee.id != request.employee_id {
            return Err(AppError::forbidden(
                "You can only access your own leave requests",
            ));
        }
    }
    Ok(request)
}

/// GET /v1/api/leave-requests
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<LeaveRequestFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<LeaveRequestResponse>> {
    let scope = if user.is_admin() {
        LeaveScope::All
    } else {
        LeaveScope::User(user.id.clone())
    };
    Ok(ApiResponse::success(
        state.leave_requests.list(scope, &filter, &page).await?,
    ))
}

/// GET /v1/api/leave-requests/me
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<LeaveRequestFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<LeaveRequestResponse>> {
    Ok(ApiResponse::success(
        state
            .leave_requests
            .list(LeaveScope::User(user.id), &filter, &page)
            .await?,
    ))
}

/// GET /v1/api/leave-requests/employee/{employee_id} (HR only)
pub async fn list_for_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
    Query(filter): Query<LeaveRequestFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<LeaveRequestResponse>> {
    Ok(ApiResponse::success(
        state
            .leave_requests
            .list(LeaveScope::Employee(employee_id), &filter, &page)
            .await?,
    ))
}

/// GET /v1/api/leave-requests/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<LeaveRequestResponse> {
    Ok(ApiResponse::success(visible(&state, &user, id).await?))
}

/// POST /v1/api/leave-requests
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> ApiResult<LeaveRequestResponse> {
    let form = LeaveForm::read(multipart).await?;
    let employee_id = acting_employee(&state, &user, form.employee_id()?).await?;
    let (input, file) = form.into_create(employee_id)?;
    let created = state.leave_requests.create(input, file).await?;
    Ok(ApiResponse::success_with_message(
        "Leave request submitted",
        created,
    ))
}

/// POST /v1/api/leave-requests/admin (HR only): created already approved
pub async fn create_for_employee(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<LeaveRequestResponse> {
    let form = LeaveForm::read(multipart).await?;
    let employee_id = form
        .employee_id()?
        .ok_or_else(|| AppError::required("employee_id"))?;
    let admin_note = form.text("admin_note");
    let (input, file) = form.into_create(employee_id)?;
    let created = state
        .leave_requests
        .create_for_employee(input, file, admin_note)
        .await?;
    Ok(ApiResponse::success_with_message(
        "Leave request created and approved",
        created,
    ))
}

/// PUT /v1/api/leave-requests/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<LeaveRequestResponse> {
    visible(&state, &user, id).await?;
    let form = LeaveForm::read(multipart).await?;
    let patch = LeaveRequestUpdate {
        leave_type: form.leave_type()?,
        start_date: form.date("start_date")?,
        end_date: form.date("end_date")?,
        employee_note: form.text("employee_note"),
    };
    Ok(ApiResponse::success(
        state.leave_requests.update(id, patch, form.file).await?,
    ))
}

/// PUT /v1/api/leave-requests/{id}/status (HR only)
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<LeaveStatusUpdate>,
) -> ApiResult<LeaveRequestResponse> {
    Ok(ApiResponse::success(
        state.leave_requests.update_status(id, req).await?,
    ))
}

/// DELETE /v1/api/leave-requests/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    visible(&state, &user, id).await?;
    state.leave_requests.delete(id).await?;
    Ok(ApiResponse::message("Leave request deleted"))
}
