//! Check-clock settings (employee to work schedule assignment)

use async_trait::async_trait;
use shared::PageQuery;
use shared::error::{AppError, ErrorCode};
use shared::models::CheckclockSetting;
use shared::util::now_millis;

use super::{CheckclockRepo, PgRepository};
use crate::error::{ServiceError, ServiceResult};

#[derive(sqlx::FromRow)]
struct CheckclockRow {
    id: i64,
    employee_id: i64,
    employee_name: Option<String>,
    work_schedule_id: i64,
    work_schedule_name: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<CheckclockRow> for CheckclockSetting {
    fn from(r: CheckclockRow) -> Self {
        Self {
            id: r.id,
            employee_id: r.employee_id,
            employee_name: r.employee_name,
            work_schedule_id: r.work_schedule_id,
            work_schedule_name: r.work_schedule_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const CHECKCLOCK_SELECT: &str = "SELECT c.id, c.employee_id, e.name AS employee_name,
        c.work_schedule_id, w.name AS work_schedule_name, c.created_at, c.updated_at
     FROM checkclock_settings c
     LEFT JOIN employees e ON e.id = c.employee_id
     LEFT JOIN work_schedules w ON w.id = c.work_schedule_id";

fn map_unique_violation(e: sqlx::Error) -> ServiceError {
    if e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
    {
        return AppError::new(ErrorCode::CheckclockSettingExists).into();
    }
    e.into()
}

impl PgRepository {
    async fn fetch_checkclock(&self, id: i64) -> Result<Option<CheckclockSetting>, sqlx::Error> {
        let row: Option<CheckclockRow> =
            sqlx::query_as(&format!("{CHECKCLOCK_SELECT} WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl CheckclockRepo for PgRepository {
    async fn list_checkclock_settings(
        &self,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<CheckclockSetting>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM checkclock_settings")
            .fetch_one(&self.pool)
            .await?;
        let rows: Vec<CheckclockRow> = sqlx::query_as(&format!(
            "{CHECKCLOCK_SELECT} ORDER BY c.id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((rows.into_iter().map(Into::into).collect(), total as u64))
    }

    async fn find_checkclock_setting(&self, id: i64) -> ServiceResult<Option<CheckclockSetting>> {
        Ok(self.fetch_checkclock(id).await?)
    }

    async fn find_checkclock_by_employee(
        &self,
        employee_id: i64,
    ) -> ServiceResult<Option<CheckclockSetting>> {
        let row: Option<CheckclockRow> =
            sqlx::query_as(&format!("{CHECKCLOCK_SELECT} WHERE c.employee_id = $1"))
                .bind(employee_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create_checkclock_setting(
        &self,
        employee_id: i64,
        work_schedule_id: i64,
    ) -> ServiceResult<CheckclockSetting> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO checkclock_settings (employee_id, work_schedule_id, created_at, updated_at)
             VALUES ($1, $2, $3, $3)
             RETURNING id",
        )
        .bind(employee_id)
        .bind(work_schedule_id)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        self.fetch_checkclock(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CheckclockSettingNotFound).into())
    }

    async fn update_checkclock_setting(
        &self,
        id: i64,
        work_schedule_id: i64,
    ) -> ServiceResult<Option<CheckclockSetting>> {
        let result = sqlx::query(
            "UPDATE checkclock_settings SET work_schedule_id = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(work_schedule_id)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(self.fetch_checkclock(id).await?)
    }

    async fn delete_checkclock_setting(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM checkclock_settings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
