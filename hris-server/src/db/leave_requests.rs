//! Leave requests and their attendance materialization

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::PageQuery;
use shared::models::{AttendanceStatus, LeaveRequest, LeaveRequestFilter, LeaveStatus, LeaveType};
use shared::util::now_millis;
use sqlx::{Postgres, Transaction};

use super::{LeaveRequestRepo, PgRepository, leave_status_db};
use crate::error::ServiceResult;

/// Which requests a list covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveScope {
    All,
    Employee(i64),
    /// Employee linked to this user account
    User(String),
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub attachment_key: Option<String>,
    pub employee_note: Option<String>,
    pub admin_note: Option<String>,
}

/// Full set of mutable fields after merging a partial update
#[derive(Debug, Clone)]
pub struct LeaveRequestChanges {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub attachment_key: Option<String>,
    pub employee_note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LeaveDecision {
    /// Approved or Rejected
    pub status: LeaveStatus,
    pub admin_note: Option<String>,
    /// Working days to record as leave attendance (empty when rejecting)
    pub attendance_days: Vec<NaiveDate>,
}

#[derive(sqlx::FromRow)]
struct LeaveRequestRow {
    id: i64,
    employee_id: i64,
    employee_name: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    attachment_key: Option<String>,
    employee_note: Option<String>,
    admin_note: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<LeaveRequestRow> for LeaveRequest {
    fn from(r: LeaveRequestRow) -> Self {
        Self {
            id: r.id,
            employee_id: r.employee_id,
            employee_name: r.employee_name,
            leave_type: LeaveType::from_db(&r.leave_type).unwrap_or(LeaveType::Other),
            start_date: r.start_date,
            end_date: r.end_date,
            status: LeaveStatus::from_db(&r.status).unwrap_or_default(),
            attachment_key: r.attachment_key,
            employee_note: r.employee_note,
            admin_note: r.admin_note,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const LEAVE_SELECT: &str = "SELECT l.id, l.employee_id, e.name AS employee_name, l.leave_type,
        l.start_date, l.end_date, l.status, l.attachment_key, l.employee_note, l.admin_note,
        l.created_at, l.updated_at
     FROM leave_requests l
     JOIN employees e ON e.id = l.employee_id";

/// $1 employee id, $2 user id, $3 status, $4 leave type, $5 from, $6 to
const LEAVE_FILTER: &str = "($1::bigint IS NULL OR l.employee_id = $1)
       AND ($2::text IS NULL OR e.user_id = $2)
       AND ($3::text IS NULL OR l.status = $3)
       AND ($4::text IS NULL OR l.leave_type = $4)
       AND ($5::date IS NULL OR l.end_date >= $5)
       AND ($6::date IS NULL OR l.start_date <= $6)";

/// Insert one leave attendance row per day, skipping days already recorded
async fn insert_leave_attendance(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: i64,
    leave_request_id: i64,
    days: &[NaiveDate],
) -> Result<u64, sqlx::Error> {
    if days.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        "INSERT INTO attendances (employee_id, date, status, leave_request_id, created_at)
         SELECT $1, d, $2, $3, $4 FROM UNNEST($5::date[]) AS d
         ON CONFLICT (employee_id, date) DO NOTHING",
    )
    .bind(employee_id)
    .bind(AttendanceStatus::Leave.as_db())
    .bind(leave_request_id)
    .bind(now_millis())
    .bind(days)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

impl PgRepository {
    async fn fetch_leave_request(&self, id: i64) -> Result<Option<LeaveRequest>, sqlx::Error> {
        let row: Option<LeaveRequestRow> =
            sqlx::query_as(&format!("{LEAVE_SELECT} WHERE l.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl LeaveRequestRepo for PgRepository {
    async fn list_leave_requests(
        &self,
        scope: &LeaveScope,
        filter: &LeaveRequestFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<LeaveRequest>, u64)> {
        let (employee_id, user_id) = match scope {
            LeaveScope::All => (None, None),
            LeaveScope::Employee(id) => (Some(*id), None),
            LeaveScope::User(uid) => (None, Some(uid.as_str())),
        };
        let status = leave_status_db(filter.status);
        let leave_type = filter.leave_type.map(|t| t.as_db());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM leave_requests l
             JOIN employees e ON e.id = l.employee_id
             WHERE {LEAVE_FILTER}"
        ))
        .bind(employee_id)
        .bind(user_id)
        .bind(status)
        .bind(leave_type)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<LeaveRequestRow> = sqlx::query_as(&format!(
            "{LEAVE_SELECT} WHERE {LEAVE_FILTER}
             ORDER BY l.created_at DESC, l.id DESC LIMIT $7 OFFSET $8"
        ))
        .bind(employee_id)
        .bind(user_id)
        .bind(status)
        .bind(leave_type)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total as u64))
    }

    async fn find_leave_request(&self, id: i64) -> ServiceResult<Option<LeaveRequest>> {
        Ok(self.fetch_leave_request(id).await?)
    }

    async fn create_leave_request(
        &self,
        request: &NewLeaveRequest,
        attendance_days: &[NaiveDate],
    ) -> ServiceResult<LeaveRequest> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, status, attachment_key,
                 employee_note, admin_note, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING id",
        )
        .bind(request.employee_id)
        .bind(request.leave_type.as_db())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.status.as_db())
        .bind(&request.attachment_key)
        .bind(&request.employee_note)
        .bind(&request.admin_note)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let inserted =
            insert_leave_attendance(&mut tx, request.employee_id, id, attendance_days).await?;
        tx.commit().await?;

        if inserted > 0 {
            tracing::info!(leave_id = id, days = inserted, "Leave attendance recorded");
        }

        let row: LeaveRequestRow = sqlx::query_as(&format!("{LEAVE_SELECT} WHERE l.id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_leave_request(
        &self,
        id: i64,
        changes: &LeaveRequestChanges,
    ) -> ServiceResult<Option<LeaveRequest>> {
        let result = sqlx::query(
            "UPDATE leave_requests SET
                leave_type = $2, start_date = $3, end_date = $4,
                attachment_key = $5, employee_note = $6, updated_at = $7
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(changes.leave_type.as_db())
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(&changes.attachment_key)
        .bind(&changes.employee_note)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(self.fetch_leave_request(id).await?)
    }

    async fn delete_leave_request(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn decide_leave_request(
        &self,
        id: i64,
        decision: &LeaveDecision,
    ) -> ServiceResult<Option<LeaveRequest>> {
        let mut tx = self.pool.begin().await?;

        let employee_id: Option<i64> = sqlx::query_scalar(
            "UPDATE leave_requests SET status = $2, admin_note = $3, updated_at = $4
             WHERE id = $1 AND status = 'pending'
             RETURNING employee_id",
        )
        .bind(id)
        .bind(decision.status.as_db())
        .bind(&decision.admin_note)
        .bind(now_millis())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(employee_id) = employee_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let inserted =
            insert_leave_attendance(&mut tx, employee_id, id, &decision.attendance_days).await?;
        tx.commit().await?;

        tracing::info!(
            leave_id = id,
            status = decision.status.as_db(),
            attendance_rows = inserted,
            "Leave request decided"
        );
        Ok(self.fetch_leave_request(id).await?)
    }
}
