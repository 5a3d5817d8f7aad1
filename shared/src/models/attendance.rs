//! Attendance Model

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    /// Materialized from an approved leave request
    Leave,
}

impl AttendanceStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Leave => "leave",
        }
    }
}

/// One record per (employee, date)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub employee_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub leave_request_id: Option<i64>,
    pub created_at: i64,
}

/// List filters (`?employee_id=1&from=2024-01-01&to=2024-01-31`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    pub employee_id: Option<i64>,
    pub status: Option<AttendanceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn matches(&self, attendance: &Attendance) -> bool {
        self.employee_id.is_none_or(|id| id == attendance.employee_id)
            && self.status.is_none_or(|s| s == attendance.status)
            && self.from.is_none_or(|from| attendance.date >= from)
            && self.to.is_none_or(|to| attendance.date <= to)
    }
}
