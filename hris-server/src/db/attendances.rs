//! Attendance records (read side)

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use shared::PageQuery;
use shared::models::{Attendance, AttendanceFilter, AttendanceStatus};

use super::{AttendanceRepo, PgRepository};
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: i64,
    employee_id: i64,
    date: NaiveDate,
    status: String,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    leave_request_id: Option<i64>,
    created_at: i64,
}

impl From<AttendanceRow> for Attendance {
    fn from(r: AttendanceRow) -> Self {
        Self {
            id: r.id,
            employee_id: r.employee_id,
            date: r.date,
            status: AttendanceStatus::from_db(&r.status).unwrap_or(AttendanceStatus::Absent),
            check_in: r.check_in,
            check_out: r.check_out,
            leave_request_id: r.leave_request_id,
            created_at: r.created_at,
        }
    }
}

/// $1 employee, $2 status, $3 from, $4 to
const ATTENDANCE_FILTER: &str = "($1::bigint IS NULL OR employee_id = $1)
       AND ($2::text IS NULL OR status = $2)
       AND ($3::date IS NULL OR date >= $3)
       AND ($4::date IS NULL OR date <= $4)";

#[async_trait]
impl AttendanceRepo for PgRepository {
    async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<Attendance>, u64)> {
        let status = filter.status.map(|s| s.as_db());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM attendances WHERE {ATTENDANCE_FILTER}"
        ))
        .bind(filter.employee_id)
        .bind(status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<AttendanceRow> = sqlx::query_as(&format!(
            "SELECT id, employee_id, date, status, check_in, check_out, leave_request_id, created_at
             FROM attendances WHERE {ATTENDANCE_FILTER}
             ORDER BY date DESC, employee_id LIMIT $5 OFFSET $6"
        ))
        .bind(filter.employee_id)
        .bind(status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total as u64))
    }
}
