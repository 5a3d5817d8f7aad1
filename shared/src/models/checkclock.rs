//! Check-clock Setting Model

use serde::{Deserialize, Serialize};

/// Assigns an employee to a work schedule (one per employee)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckclockSetting {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: Option<String>,
    pub work_schedule_id: i64,
    pub work_schedule_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckclockSettingCreate {
    pub employee_id: i64,
    pub work_schedule_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckclockSettingUpdate {
    pub work_schedule_id: i64,
}
