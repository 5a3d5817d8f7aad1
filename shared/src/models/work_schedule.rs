//! Work Schedule Model
//!
//! A schedule owns its details; each detail covers a set of weekdays with
//! check-in/check-out windows and, for office work, a location.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::location::Location;
use crate::date::{format_time, parse_time, parse_weekday, weekday_name, weekday_to_iso};
use crate::error::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkType {
    /// Work from office, requires a location
    #[serde(rename = "WFO")]
    Wfo,
    /// Work from home
    #[serde(rename = "WFH")]
    Wfh,
    Hybrid,
}

impl WorkType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "WFO" => Some(Self::Wfo),
            "WFH" => Some(Self::Wfh),
            "Hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Wfo => "WFO",
            Self::Wfh => "WFH",
            Self::Hybrid => "Hybrid",
        }
    }

    pub fn requires_location(&self) -> bool {
        matches!(self, Self::Wfo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub id: i64,
    pub name: String,
    pub work_type: WorkType,
    pub is_active: bool,
    pub details: Vec<WorkScheduleDetail>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl WorkSchedule {
    /// Whether any active detail covers `day`
    pub fn covers(&self, day: Weekday) -> bool {
        self.details
            .iter()
            .any(|d| d.is_active && d.work_days.contains(&day))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkScheduleDetail {
    pub id: i64,
    pub work_schedule_id: i64,
    pub work_type: WorkType,
    pub work_days: Vec<Weekday>,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    pub check_out_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub location_id: Option<i64>,
    /// Denormalised on read
    pub location: Option<Location>,
    pub is_active: bool,
}

/// Parsed detail ready to persist; `id` set means update
#[derive(Debug, Clone, PartialEq)]
pub struct WorkScheduleDetailDraft {
    pub id: Option<i64>,
    pub work_type: WorkType,
    pub work_days: Vec<Weekday>,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    pub check_out_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub location_id: Option<i64>,
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Detail as sent by clients: weekday names and `HH:MM[:SS]` times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkScheduleDetailInput {
    pub id: Option<i64>,
    pub work_type: WorkType,
    pub work_days: Vec<String>,
    pub check_in_start: String,
    pub check_in_end: String,
    pub check_out_start: String,
    pub check_out_end: String,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub location_id: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl WorkScheduleDetailInput {
    /// Parse names and times; weekdays come out sorted Monday-first, deduplicated
    pub fn to_draft(&self) -> AppResult<WorkScheduleDetailDraft> {
        let mut work_days = self
            .work_days
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<AppResult<Vec<_>>>()
            .map_err(|e| {
                AppError::with_message(ErrorCode::WorkScheduleDetailInvalid, e.message)
                    .with_detail("field", "work_days")
            })?;
        work_days.sort_by_key(|d| weekday_to_iso(*d));
        work_days.dedup();

        let optional = |value: &Option<String>, field: &str| {
            value
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse_time(s, field))
                .transpose()
        };

        Ok(WorkScheduleDetailDraft {
            id: self.id,
            work_type: self.work_type,
            work_days,
            check_in_start: parse_time(&self.check_in_start, "check_in_start")?,
            check_in_end: parse_time(&self.check_in_end, "check_in_end")?,
            check_out_start: parse_time(&self.check_out_start, "check_out_start")?,
            check_out_end: parse_time(&self.check_out_end, "check_out_end")?,
            break_start: optional(&self.break_start, "break_start")?,
            break_end: optional(&self.break_end, "break_end")?,
            location_id: self.location_id,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkScheduleCreate {
    pub name: String,
    pub work_type: WorkType,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub details: Vec<WorkScheduleDetailInput>,
}

/// Patch the schedule, upsert `details`, delete `delete_detail_ids`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkScheduleUpdate {
    pub name: Option<String>,
    pub work_type: Option<WorkType>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub details: Vec<WorkScheduleDetailInput>,
    #[serde(default)]
    pub delete_detail_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkScheduleFilter {
    /// Case-insensitive name match
    pub search: Option<String>,
}

/// Detail view: weekday names, `HH:MM:SS` times, nested location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkScheduleDetailResponse {
    pub id: i64,
    pub work_type: WorkType,
    pub work_days: Vec<String>,
    pub check_in_start: String,
    pub check_in_end: String,
    pub check_out_start: String,
    pub check_out_end: String,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub location_id: Option<i64>,
    pub location: Option<Location>,
    pub is_active: bool,
}

impl From<WorkScheduleDetail> for WorkScheduleDetailResponse {
    fn from(d: WorkScheduleDetail) -> Self {
        Self {
            id: d.id,
            work_type: d.work_type,
            work_days: d
                .work_days
                .iter()
                .map(|w| weekday_name(*w).to_string())
                .collect(),
            check_in_start: format_time(d.check_in_start),
            check_in_end: format_time(d.check_in_end),
            check_out_start: format_time(d.check_out_start),
            check_out_end: format_time(d.check_out_end),
            break_start: d.break_start.map(format_time),
            break_end: d.break_end.map(format_time),
            location_id: d.location_id,
            location: d.location,
            is_active: d.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkScheduleResponse {
    pub id: i64,
    pub name: String,
    pub work_type: WorkType,
    pub is_active: bool,
    pub details: Vec<WorkScheduleDetailResponse>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<WorkSchedule> for WorkScheduleResponse {
    fn from(s: WorkSchedule) -> Self {
        Self {
            id: s.id,
            name: s.name,
            work_type: s.work_type,
            is_active: s.is_active,
            details: s.details.into_iter().map(Into::into).collect(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
