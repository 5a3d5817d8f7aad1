//! Work schedules and their details

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveTime;
use shared::PageQuery;
use shared::date::{weekday_from_iso, weekday_to_iso};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Location, WorkSchedule, WorkScheduleDetail, WorkScheduleDetailDraft, WorkScheduleFilter,
    WorkType,
};
use shared::util::now_millis;
use sqlx::{Postgres, Transaction};

use super::{PgRepository, WorkScheduleRepo, like_pattern};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct NewWorkSchedule {
    pub name: String,
    pub work_type: WorkType,
    pub is_active: bool,
}

/// Parent fields to patch; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct WorkScheduleChanges {
    pub name: Option<String>,
    pub work_type: Option<WorkType>,
    pub is_active: Option<bool>,
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: i64,
    name: String,
    work_type: String,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: i64,
    work_schedule_id: i64,
    work_type: String,
    work_days: Vec<i16>,
    check_in_start: NaiveTime,
    check_in_end: NaiveTime,
    check_out_start: NaiveTime,
    check_out_end: NaiveTime,
    break_start: Option<NaiveTime>,
    break_end: Option<NaiveTime>,
    location_id: Option<i64>,
    is_active: bool,
    loc_name: Option<String>,
    loc_address: Option<String>,
    loc_latitude: Option<f64>,
    loc_longitude: Option<f64>,
    loc_radius_m: Option<i32>,
    loc_created_at: Option<i64>,
    loc_updated_at: Option<i64>,
}

impl From<DetailRow> for WorkScheduleDetail {
    fn from(r: DetailRow) -> Self {
        let location = match (
            r.location_id,
            r.loc_name,
            r.loc_latitude,
            r.loc_longitude,
            r.loc_radius_m,
        ) {
            (Some(id), Some(name), Some(latitude), Some(longitude), Some(radius_m)) => {
                Some(Location {
                    id,
                    name,
                    address: r.loc_address,
                    latitude,
                    longitude,
                    radius_m,
                    created_at: r.loc_created_at.unwrap_or_default(),
                    updated_at: r.loc_updated_at.unwrap_or_default(),
                })
            }
            _ => None,
        };

        Self {
            id: r.id,
            work_schedule_id: r.work_schedule_id,
            work_type: WorkType::from_db(&r.work_type).unwrap_or(WorkType::Wfo),
            work_days: r.work_days.into_iter().filter_map(weekday_from_iso).collect(),
            check_in_start: r.check_in_start,
            check_in_end: r.check_in_end,
            check_out_start: r.check_out_start,
            check_out_end: r.check_out_end,
            break_start: r.break_start,
            break_end: r.break_end,
            location_id: r.location_id,
            location,
            is_active: r.is_active,
        }
    }
}

impl ScheduleRow {
    fn into_schedule(self, details: Vec<WorkScheduleDetail>) -> WorkSchedule {
        WorkSchedule {
            id: self.id,
            name: self.name,
            work_type: WorkType::from_db(&self.work_type).unwrap_or(WorkType::Wfo),
            is_active: self.is_active,
            details,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SCHEDULE_COLUMNS: &str = "id, name, work_type, is_active, created_at, updated_at";

const DETAIL_SELECT: &str = "SELECT d.id, d.work_schedule_id, d.work_type, d.work_days,
        d.check_in_start, d.check_in_end, d.check_out_start, d.check_out_end,
        d.break_start, d.break_end, d.location_id, d.is_active,
        l.name AS loc_name, l.address AS loc_address, l.latitude AS loc_latitude,
        l.longitude AS loc_longitude, l.radius_m AS loc_radius_m,
        l.created_at AS loc_created_at, l.updated_at AS loc_updated_at
     FROM work_schedule_details d
     LEFT JOIN locations l ON l.id = d.location_id";

fn iso_days(draft: &WorkScheduleDetailDraft) -> Vec<i16> {
    draft.work_days.iter().map(|d| weekday_to_iso(*d)).collect()
}

async fn insert_detail(
    tx: &mut Transaction<'_, Postgres>,
    schedule_id: i64,
    draft: &WorkScheduleDetailDraft,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO work_schedule_details
            (work_schedule_id, work_type, work_days, check_in_start, check_in_end,
             check_out_start, check_out_end, break_start, break_end, location_id, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(schedule_id)
    .bind(draft.work_type.as_db())
    .bind(iso_days(draft))
    .bind(draft.check_in_start)
    .bind(draft.check_in_end)
    .bind(draft.check_out_start)
    .bind(draft.check_out_end)
    .bind(draft.break_start)
    .bind(draft.break_end)
    .bind(draft.location_id)
    .bind(draft.is_active)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// `false` when the detail does not belong to the schedule
async fn update_detail(
    tx: &mut Transaction<'_, Postgres>,
    schedule_id: i64,
    detail_id: i64,
    draft: &WorkScheduleDetailDraft,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE work_schedule_details SET
            work_type = $3, work_days = $4, check_in_start = $5, check_in_end = $6,
            check_out_start = $7, check_out_end = $8, break_start = $9, break_end = $10,
            location_id = $11, is_active = $12
         WHERE id = $1 AND work_schedule_id = $2",
    )
    .bind(detail_id)
    .bind(schedule_id)
    .bind(draft.work_type.as_db())
    .bind(iso_days(draft))
    .bind(draft.check_in_start)
    .bind(draft.check_in_end)
    .bind(draft.check_out_start)
    .bind(draft.check_out_end)
    .bind(draft.break_start)
    .bind(draft.break_end)
    .bind(draft.location_id)
    .bind(draft.is_active)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}

fn foreign_detail(detail_id: i64) -> ServiceError {
    AppError::with_message(
        ErrorCode::WorkScheduleDetailInvalid,
        format!("detail {detail_id} does not belong to this schedule"),
    )
    .with_detail("detail_id", detail_id)
    .into()
}

impl PgRepository {
    async fn load_details(
        &self,
        schedule_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<WorkScheduleDetail>>, sqlx::Error> {
        let rows: Vec<DetailRow> = sqlx::query_as(&format!(
            "{DETAIL_SELECT} WHERE d.work_schedule_id = ANY($1) ORDER BY d.id"
        ))
        .bind(schedule_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<WorkScheduleDetail>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.work_schedule_id)
                .or_default()
                .push(row.into());
        }
        Ok(grouped)
    }
}

#[async_trait]
impl WorkScheduleRepo for PgRepository {
    async fn list_work_schedules(
        &self,
        filter: &WorkScheduleFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<WorkSchedule>, u64)> {
        let search = like_pattern(filter.search.as_deref());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM work_schedules WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM work_schedules
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY name, id LIMIT $2 OFFSET $3"
        ))
        .bind(&search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut details = self.load_details(&ids).await?;
        let schedules = rows
            .into_iter()
            .map(|r| {
                let d = details.remove(&r.id).unwrap_or_default();
                r.into_schedule(d)
            })
            .collect();

        Ok((schedules, total as u64))
    }

    async fn find_work_schedule(&self, id: i64) -> ServiceResult<Option<WorkSchedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let details = self
            .load_details(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(row.into_schedule(details)))
    }

    async fn create_work_schedule(
        &self,
        schedule: &NewWorkSchedule,
        details: &[WorkScheduleDetailDraft],
    ) -> ServiceResult<i64> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO work_schedules (name, work_type, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id",
        )
        .bind(&schedule.name)
        .bind(schedule.work_type.as_db())
        .bind(schedule.is_active)
        .bind(now_millis())
        .fetch_one(&mut *tx)
        .await?;

        for draft in details {
            insert_detail(&mut tx, id, draft).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn update_work_schedule(
        &self,
        id: i64,
        changes: &WorkScheduleChanges,
        details: &[WorkScheduleDetailDraft],
        delete_detail_ids: &[i64],
    ) -> ServiceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE work_schedules SET
                name = COALESCE($2, name),
                work_type = COALESCE($3, work_type),
                is_active = COALESCE($4, is_active),
                updated_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.work_type.map(|t| t.as_db()))
        .bind(changes.is_active)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for draft in details {
            match draft.id {
                Some(detail_id) => {
                    if !update_detail(&mut tx, id, detail_id, draft).await? {
                        tx.rollback().await?;
                        return Err(foreign_detail(detail_id));
                    }
                }
                None => insert_detail(&mut tx, id, draft).await?,
            }
        }

        if !delete_detail_ids.is_empty() {
            sqlx::query(
                "DELETE FROM work_schedule_details WHERE work_schedule_id = $1 AND id = ANY($2)",
            )
            .bind(id)
            .bind(delete_detail_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_work_schedule(&self, id: i64) -> ServiceResult<bool> {
        // Details and check-clock assignments cascade
        let result = sqlx::query("DELETE FROM work_schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_schedule_for_employee(
        &self,
        employee_id: i64,
    ) -> ServiceResult<Option<WorkSchedule>> {
        let schedule_id: Option<i64> = sqlx::query_scalar(
            "SELECT work_schedule_id FROM checkclock_settings WHERE employee_id = $1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        match schedule_id {
            Some(id) => self.find_work_schedule(id).await,
            None => Ok(None),
        }
    }
}
