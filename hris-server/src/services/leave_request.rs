//! Leave request workflow
//!
//! Requests start pending and may be edited or withdrawn until an admin
//! decides them. Approval materializes one `leave` attendance row per
//! working day in the range, in the same transaction as the status change.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Employee, LeaveRequest, LeaveRequestCreate, LeaveRequestFilter, LeaveRequestResponse,
    LeaveRequestUpdate, LeaveStatus, LeaveStatusUpdate, WorkSchedule,
};
use shared::util::{now_secs, sanitize_file_name};
use shared::{DateRange, PageQuery, Paginated};

use crate::db::{
    EmployeeRepo, LeaveDecision, LeaveRequestChanges, LeaveRequestRepo, LeaveScope,
    NewLeaveRequest, WorkScheduleRepo,
};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{Attachment, ObjectStorage};

/// Maximum attachment size (5 MB)
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Longest leave a single request may cover, in calendar days
pub const MAX_LEAVE_DAYS: i64 = 366;

/// Ordered range of at most [`MAX_LEAVE_DAYS`] days
pub fn leave_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, AppError> {
    let range = DateRange::new(start, end)?;
    if range.len_days() > MAX_LEAVE_DAYS {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Leave may cover at most {MAX_LEAVE_DAYS} days"),
        )
        .with_detail("days", range.len_days()));
    }
    Ok(range)
}

/// Reject empty, oversized or unsupported attachments
pub fn validate_attachment(attachment: &Attachment) -> Result<(), AppError> {
    if attachment.bytes.is_empty() {
        return Err(AppError::new(ErrorCode::NoFileProvided));
    }
    if attachment.bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!(
                "File too large: {} bytes (max {} bytes)",
                attachment.bytes.len(),
                MAX_ATTACHMENT_BYTES
            ),
        ));
    }
    let extension = attachment
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!("Unsupported file type: {}", attachment.file_name),
        )
        .with_detail("allowed", ALLOWED_EXTENSIONS.join(", ")));
    }
    Ok(())
}

/// Storage key: `leave-requests/{employeeCode}_{unixSecs}_{sanitizedName}`
pub fn attachment_key(employee_code: &str, timestamp: i64, file_name: &str) -> String {
    format!(
        "leave-requests/{}_{}_{}",
        sanitize_file_name(employee_code),
        timestamp,
        sanitize_file_name(file_name)
    )
}

/// Whether `day` is a rest day under the employee's schedule
///
/// Rest days are the weekdays no active detail covers. Without an active
/// schedule the weekend is the rest period.
pub fn is_rest_day(schedule: Option<&WorkSchedule>, day: Weekday) -> bool {
    match schedule.filter(|s| s.is_active && s.details.iter().any(|d| d.is_active)) {
        Some(schedule) => !schedule.covers(day),
        None => matches!(day, Weekday::Sat | Weekday::Sun),
    }
}

pub struct LeaveRequestService {
    leaves: Arc<dyn LeaveRequestRepo>,
    employees: Arc<dyn EmployeeRepo>,
    schedules: Arc<dyn WorkScheduleRepo>,
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
}

impl LeaveRequestService {
    pub fn new(
        leaves: Arc<dyn LeaveRequestRepo>,
        employees: Arc<dyn EmployeeRepo>,
        schedules: Arc<dyn WorkScheduleRepo>,
        storage: Arc<dyn ObjectStorage>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            leaves,
            employees,
            schedules,
            storage,
            bucket: bucket.into(),
        }
    }

    /// Submit a pending request
    pub async fn create(
        &self,
        input: LeaveRequestCreate,
        attachment: Option<Attachment>,
    ) -> ServiceResult<LeaveRequestResponse> {
        self.submit(input, attachment, None).await
    }

    /// Create an already-approved request on behalf of an employee
    pub async fn create_for_employee(
        &self,
        input: LeaveRequestCreate,
        attachment: Option<Attachment>,
        admin_note: Option<String>,
    ) -> ServiceResult<LeaveRequestResponse> {
        self.submit(input, attachment, Some(admin_note)).await
    }

    /// `approval` set means auto-approve with that admin note
    async fn submit(
        &self,
        input: LeaveRequestCreate,
        attachment: Option<Attachment>,
        approval: Option<Option<String>>,
    ) -> ServiceResult<LeaveRequestResponse> {
        let range = leave_range(input.start_date, input.end_date)?;
        if let Some(file) = &attachment {
            validate_attachment(file)?;
        }
        let employee = self.employee(input.employee_id).await?;

        let (status, admin_note, days) = match approval {
            Some(note) => (
                LeaveStatus::Approved,
                note,
                self.working_days(employee.id, &range).await?,
            ),
            None => (LeaveStatus::Pending, None, Vec::new()),
        };

        let attachment_key = match attachment {
            Some(file) => Some(self.upload(&employee, file).await?),
            None => None,
        };

        let new = NewLeaveRequest {
            employee_id: employee.id,
            leave_type: input.leave_type,
            start_date: range.start(),
            end_date: range.end(),
            status,
            attachment_key: attachment_key.clone(),
            employee_note: input.employee_note,
            admin_note,
        };

        match self.leaves.create_leave_request(&new, &days).await {
            Ok(created) => {
                tracing::info!(
                    leave_id = created.id,
                    employee_id = employee.id,
                    status = created.status.as_db(),
                    "Leave request created"
                );
                Ok(self.response(created))
            }
            Err(e) => {
                tracing::error!(employee_id = employee.id, error = %e, "failed to create leave request");
                if let Some(key) = attachment_key {
                    self.discard(key).await;
                }
                Err(e)
            }
        }
    }

    /// Approve or reject a pending request
    pub async fn update_status(
        &self,
        id: i64,
        input: LeaveStatusUpdate,
    ) -> ServiceResult<LeaveRequestResponse> {
        let status = match LeaveStatus::parse(&input.status) {
            Some(s @ (LeaveStatus::Approved | LeaveStatus::Rejected)) => s,
            _ => {
                return Err(AppError::with_message(
                    ErrorCode::InvalidLeaveStatus,
                    format!(
                        "invalid status '{}': must be Approved or Rejected",
                        input.status
                    ),
                )
                .into());
            }
        };

        let current = self.find(id).await?;
        let action = match status {
            LeaveStatus::Approved => "approve",
            _ => "reject",
        };
        current.ensure_pending(action)?;

        let attendance_days = match status {
            LeaveStatus::Approved => {
                self.working_days(current.employee_id, &current.date_range()?)
                    .await?
            }
            _ => Vec::new(),
        };

        let decision = LeaveDecision {
            status,
            admin_note: input.admin_note,
            attendance_days,
        };
        match self.leaves.decide_leave_request(id, &decision).await? {
            Some(decided) => Ok(self.response(decided)),
            None => Err(self.stale(id, action).await),
        }
    }

    /// Patch a pending request, optionally replacing its attachment
    pub async fn update(
        &self,
        id: i64,
        patch: LeaveRequestUpdate,
        attachment: Option<Attachment>,
    ) -> ServiceResult<LeaveRequestResponse> {
        let current = self.find(id).await?;
        let range = leave_range(
            patch.start_date.unwrap_or(current.start_date),
            patch.end_date.unwrap_or(current.end_date),
        )?;
        current.ensure_pending("update")?;
        if let Some(file) = &attachment {
            validate_attachment(file)?;
        }

        let new_key = match attachment {
            Some(file) => {
                let employee = self.employee(current.employee_id).await?;
                Some(self.upload(&employee, file).await?)
            }
            None => None,
        };

        let changes = LeaveRequestChanges {
            leave_type: patch.leave_type.unwrap_or(current.leave_type),
            start_date: range.start(),
            end_date: range.end(),
            attachment_key: new_key.clone().or_else(|| current.attachment_key.clone()),
            employee_note: patch.employee_note.or_else(|| current.employee_note.clone()),
        };

        let result = match self.leaves.update_leave_request(id, &changes).await {
            Ok(Some(updated)) => Ok(updated),
            Ok(None) => Err(self.stale(id, "update").await),
            Err(e) => {
                tracing::error!(leave_id = id, error = %e, "failed to update leave request");
                Err(e)
            }
        };

        match result {
            Ok(updated) => {
                if new_key.is_some()
                    && let Some(old) = current.attachment_key
                {
                    self.discard(old).await;
                }
                tracing::info!(leave_id = id, "Leave request updated");
                Ok(self.response(updated))
            }
            Err(e) => {
                if let Some(key) = new_key {
                    self.discard(key).await;
                }
                Err(e)
            }
        }
    }

    /// Withdraw a pending request
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let current = self.find(id).await?;
        current.ensure_pending("delete")?;

        if !self.leaves.delete_leave_request(id).await? {
            return Err(self.stale(id, "delete").await);
        }
        if let Some(key) = current.attachment_key {
            self.discard(key).await;
        }
        tracing::info!(leave_id = id, "Leave request deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> ServiceResult<LeaveRequestResponse> {
        let request = self.find(id).await?;
        Ok(self.response(request))
    }

    pub async fn list(
        &self,
        scope: LeaveScope,
        filter: &LeaveRequestFilter,
        page: &PageQuery,
    ) -> ServiceResult<Paginated<LeaveRequestResponse>> {
        let (items, total) = self.leaves.list_leave_requests(&scope, filter, page).await?;
        let items = items.into_iter().map(|r| self.response(r)).collect();
        Ok(Paginated::new(items, total, page))
    }

    /// Employee record linked to a user account
    pub async fn employee_for_user(&self, user_id: &str) -> ServiceResult<Employee> {
        self.employees
            .find_employee_by_user(user_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::EmployeeNotFound,
                    "No employee record is linked to this account",
                )
                .into()
            })
    }

    /// Days in `range` that are not rest days for the employee
    pub async fn working_days(
        &self,
        employee_id: i64,
        range: &DateRange,
    ) -> ServiceResult<Vec<NaiveDate>> {
        let schedule = self.schedules.find_schedule_for_employee(employee_id).await?;
        Ok(range
            .days()
            .filter(|d| !is_rest_day(schedule.as_ref(), d.weekday()))
            .collect())
    }

    async fn find(&self, id: i64) -> ServiceResult<LeaveRequest> {
        self.leaves
            .find_leave_request(id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::LeaveRequestNotFound)
                    .with_detail("leave_request_id", id)
                    .into()
            })
    }

    async fn employee(&self, id: i64) -> ServiceResult<Employee> {
        self.employees.find_employee(id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::EmployeeNotFound)
                .with_detail("employee_id", id)
                .into()
        })
    }

    /// Error for a conditional write that matched no pending row
    async fn stale(&self, id: i64, action: &str) -> ServiceError {
        match self.find(id).await {
            Ok(current) => match current.ensure_pending(action) {
                Err(e) => e.into(),
                Ok(()) => AppError::with_message(
                    ErrorCode::LeaveRequestNotPending,
                    "leave request changed concurrently, retry",
                )
                .into(),
            },
            Err(e) => e,
        }
    }

    async fn upload(&self, employee: &Employee, file: Attachment) -> ServiceResult<String> {
        let key = attachment_key(&employee.employee_code, now_secs(), &file.file_name);
        self.storage
            .upload(&self.bucket, &key, file.bytes, &file.content_type)
            .await?;
        tracing::debug!(key = %key, "Leave attachment uploaded");
        Ok(key)
    }

    /// Best-effort removal of a stored attachment
    async fn discard(&self, key: String) {
        if let Err(e) = self
            .storage
            .delete(&self.bucket, std::slice::from_ref(&key))
            .await
        {
            tracing::warn!(key = %key, error = %e, "Failed to delete leave attachment");
        }
    }

    fn response(&self, request: LeaveRequest) -> LeaveRequestResponse {
        let url = request
            .attachment_key
            .as_deref()
            .map(|key| self.storage.public_url(&self.bucket, key));
        LeaveRequestResponse::new(request, url)
    }
}
