//! Employee & Position Models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Employment status; employees are never hard-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    /// Linked user account (identity provider UID)
    pub user_id: Option<String>,
    pub employee_code: String,
    pub name: String,
    pub position_id: i64,
    pub position_name: Option<String>,
    pub status: EmployeeStatus,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub join_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create employee payload
///
/// When `email` and `password` are both present a login account with the
/// employee role is created alongside the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub employee_code: String,
    pub name: String,
    pub position_id: i64,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub join_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Update employee payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub position_id: Option<i64>,
    pub status: Option<EmployeeStatus>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub join_date: Option<NaiveDate>,
}

/// List filters (`?status=active&position_id=2&search=ani`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeFilter {
    pub status: Option<EmployeeStatus>,
    pub position_id: Option<i64>,
    /// Case-insensitive match on name or employee code
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionCreate {
    pub name: String,
}
