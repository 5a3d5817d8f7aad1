//! Check-clock settings: which work schedule an employee follows

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{CheckclockSetting, CheckclockSettingCreate, CheckclockSettingUpdate};
use shared::{PageQuery, Paginated};

use crate::db::{CheckclockRepo, EmployeeRepo, WorkScheduleRepo};
use crate::error::ServiceResult;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::CheckclockSettingNotFound).with_detail("checkclock_setting_id", id)
}

pub struct CheckclockService {
    settings: Arc<dyn CheckclockRepo>,
    employees: Arc<dyn EmployeeRepo>,
    schedules: Arc<dyn WorkScheduleRepo>,
}

impl CheckclockService {
    pub fn new(
        settings: Arc<dyn CheckclockRepo>,
        employees: Arc<dyn EmployeeRepo>,
        schedules: Arc<dyn WorkScheduleRepo>,
    ) -> Self {
        Self {
            settings,
            employees,
            schedules,
        }
    }

    pub async fn list(&self, page: &PageQuery) -> ServiceResult<Paginated<CheckclockSetting>> {
        let (items, total) = self.settings.list_checkclock_settings(page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<CheckclockSetting> {
        self.settings
            .find_checkclock_setting(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    pub async fn create(&self, input: CheckclockSettingCreate) -> ServiceResult<CheckclockSetting> {
        if self.employees.find_employee(input.employee_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::EmployeeNotFound)
                .with_detail("employee_id", input.employee_id)
                .into());
        }
        self.ensure_schedule(input.work_schedule_id).await?;
        if self
            .settings
            .find_checkclock_by_employee(input.employee_id)
            .await?
            .is_some()
        {
            return Err(AppError::new(ErrorCode::CheckclockSettingExists)
                .with_detail("employee_id", input.employee_id)
                .into());
        }

        let setting = self
            .settings
            .create_checkclock_setting(input.employee_id, input.work_schedule_id)
            .await?;
        tracing::info!(
            setting_id = setting.id,
            employee_id = setting.employee_id,
            schedule_id = setting.work_schedule_id,
            "Check-clock setting created"
        );
        Ok(setting)
    }

    pub async fn update(
        &self,
        id: i64,
        input: CheckclockSettingUpdate,
    ) -> ServiceResult<CheckclockSetting> {
        self.ensure_schedule(input.work_schedule_id).await?;
        self.settings
            .update_checkclock_setting(id, input.work_schedule_id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.settings.delete_checkclock_setting(id).await? {
            return Err(not_found(id).into());
        }
        Ok(())
    }

    async fn ensure_schedule(&self, id: i64) -> ServiceResult<()> {
        if self.schedules.find_work_schedule(id).await?.is_none() {
            return Err(AppError::new(ErrorCode::WorkScheduleNotFound)
                .with_detail("work_schedule_id", id)
                .into());
        }
        Ok(())
    }
}
