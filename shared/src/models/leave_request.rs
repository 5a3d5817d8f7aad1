//! Leave Request Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::{DateRange, format_date};
use crate::error::{AppError, AppResult, ErrorCode};

/// Leave request status
///
/// `Pending` is shown to users as "Waiting Approval". Approved and rejected
/// requests are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[default]
    #[serde(rename = "Waiting Approval", alias = "pending", alias = "Pending")]
    Pending,
    #[serde(rename = "Approved", alias = "approved")]
    Approved,
    #[serde(rename = "Rejected", alias = "rejected")]
    Rejected,
}

impl LeaveStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Waiting Approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Parse a label or database value, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "waiting approval" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Marriage,
    Bereavement,
    Unpaid,
    Other,
}

impl LeaveType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "annual" => Some(Self::Annual),
            "sick" => Some(Self::Sick),
            "maternity" => Some(Self::Maternity),
            "paternity" => Some(Self::Paternity),
            "marriage" => Some(Self::Marriage),
            "bereavement" => Some(Self::Bereavement),
            "unpaid" => Some(Self::Unpaid),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Sick => "sick",
            Self::Maternity => "maternity",
            Self::Paternity => "paternity",
            Self::Marriage => "marriage",
            Self::Bereavement => "bereavement",
            Self::Unpaid => "unpaid",
            Self::Other => "other",
        }
    }

    /// Parse `Annual`, `annual`, `ANNUAL`, ...
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_db(&s.trim().to_ascii_lowercase())
    }
}

/// Stored leave request, joined with the employee's name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    /// Object storage key of the attachment
    pub attachment_key: Option<String>,
    pub employee_note: Option<String>,
    pub admin_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LeaveRequest {
    pub fn date_range(&self) -> AppResult<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Calendar days covered, both ends included; 0 for a reversed range
    pub fn total_days(&self) -> i64 {
        self.date_range().map_or(0, |range| range.len_days())
    }

    /// Reject mutation of a request that is no longer pending
    pub fn ensure_pending(&self, action: &str) -> AppResult<()> {
        if self.status.is_pending() {
            return Ok(());
        }
        Err(AppError::with_message(
            ErrorCode::LeaveRequestNotPending,
            format!("cannot {action} leave request with status: {}", self.status),
        )
        .with_detail("leave_request_id", self.id))
    }
}

/// Leave request as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequestResponse {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub leave_type: LeaveType,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
    pub total_days: i64,
    pub status: LeaveStatus,
    pub attachment_url: Option<String>,
    pub employee_note: Option<String>,
    pub admin_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LeaveRequestResponse {
    pub fn new(request: LeaveRequest, attachment_url: Option<String>) -> Self {
        Self {
            total_days: request.total_days(),
            id: request.id,
            employee_id: request.employee_id,
            employee_name: request.employee_name,
            leave_type: request.leave_type,
            start_date: format_date(request.start_date),
            end_date: format_date(request.end_date),
            status: request.status,
            attachment_url,
            employee_note: request.employee_note,
            admin_note: request.admin_note,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// Create leave request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequestCreate {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub employee_note: Option<String>,
}

/// Partial update; unset fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveRequestUpdate {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub employee_note: Option<String>,
}

impl LeaveRequestUpdate {
    pub fn is_empty(&self) -> bool {
        self.leave_type.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.employee_note.is_none()
    }
}

/// Approve / reject payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveStatusUpdate {
    pub status: String,
    pub admin_note: Option<String>,
}

/// List filters, applied in the query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveRequestFilter {
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    /// Requests ending on or after this date
    pub from: Option<NaiveDate>,
    /// Requests starting on or before this date
    pub to: Option<NaiveDate>,
}

impl LeaveRequestFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.status.is_none_or(|s| s == request.status)
            && self.leave_type.is_none_or(|t| t == request.leave_type)
            && self.from.is_none_or(|from| request.end_date >= from)
            && self.to.is_none_or(|to| request.start_date <= to)
    }
}
