//! Employee records

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::PageQuery;
use shared::error::{AppError, ErrorCode};
use shared::models::{Employee, EmployeeFilter, EmployeeStatus, EmployeeUpdate, Gender};
use shared::util::now_millis;

use super::{EmployeeRepo, PgRepository, like_pattern};
use crate::error::{ServiceError, ServiceResult};

/// Insert payload (account link resolved by the service)
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub user_id: Option<String>,
    pub employee_code: String,
    pub name: String,
    pub position_id: i64,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub join_date: Option<NaiveDate>,
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: i64,
    user_id: Option<String>,
    employee_code: String,
    name: String,
    position_id: i64,
    position_name: Option<String>,
    status: String,
    phone: Option<String>,
    gender: Option<String>,
    join_date: Option<NaiveDate>,
    created_at: i64,
    updated_at: i64,
}

impl From<EmployeeRow> for Employee {
    fn from(r: EmployeeRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            employee_code: r.employee_code,
            name: r.name,
            position_id: r.position_id,
            position_name: r.position_name,
            status: EmployeeStatus::from_db(&r.status).unwrap_or_default(),
            phone: r.phone,
            gender: r.gender.as_deref().and_then(Gender::from_db),
            join_date: r.join_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const EMPLOYEE_SELECT: &str = "SELECT e.id, e.user_id, e.employee_code, e.name, e.position_id,
        p.name AS position_name, e.status, e.phone, e.gender, e.join_date,
        e.created_at, e.updated_at
     FROM employees e
     LEFT JOIN positions p ON p.id = e.position_id";

const EMPLOYEE_FILTER: &str = "($1::text IS NULL OR e.status = $1)
       AND ($2::bigint IS NULL OR e.position_id = $2)
       AND ($3::text IS NULL OR e.name ILIKE $3 OR e.employee_code ILIKE $3)";

fn map_unique_violation(e: sqlx::Error) -> ServiceError {
    if e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
    {
        return AppError::new(ErrorCode::EmployeeCodeExists).into();
    }
    e.into()
}

impl PgRepository {
    async fn fetch_employee(&self, id: i64) -> Result<Option<Employee>, sqlx::Error> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{EMPLOYEE_SELECT} WHERE e.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl EmployeeRepo for PgRepository {
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<Employee>, u64)> {
        let status = filter.status.map(|s| s.as_db());
        let search = like_pattern(filter.search.as_deref());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM employees e WHERE {EMPLOYEE_FILTER}"
        ))
        .bind(status)
        .bind(filter.position_id)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<EmployeeRow> = sqlx::query_as(&format!(
            "{EMPLOYEE_SELECT} WHERE {EMPLOYEE_FILTER} ORDER BY e.name, e.id LIMIT $4 OFFSET $5"
        ))
        .bind(status)
        .bind(filter.position_id)
        .bind(&search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total as u64))
    }

    async fn find_employee(&self, id: i64) -> ServiceResult<Option<Employee>> {
        Ok(self.fetch_employee(id).await?)
    }

    async fn find_employee_by_code(&self, code: &str) -> ServiceResult<Option<Employee>> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{EMPLOYEE_SELECT} WHERE e.employee_code = $1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn find_employee_by_user(&self, user_id: &str) -> ServiceResult<Option<Employee>> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{EMPLOYEE_SELECT} WHERE e.user_id = $1"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create_employee(&self, employee: &NewEmployee) -> ServiceResult<Employee> {
        let now = now_millis();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO employees
                (user_id, employee_code, name, position_id, status, phone, gender, join_date,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, 'active', $5, $6, $7, $8, $8)
             RETURNING id",
        )
        .bind(&employee.user_id)
        .bind(&employee.employee_code)
        .bind(&employee.name)
        .bind(employee.position_id)
        .bind(&employee.phone)
        .bind(employee.gender.map(|g| g.as_db()))
        .bind(employee.join_date)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        self.fetch_employee(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::EmployeeNotFound).into())
    }

    async fn update_employee(
        &self,
        id: i64,
        update: &EmployeeUpdate,
    ) -> ServiceResult<Option<Employee>> {
        let result = sqlx::query(
            "UPDATE employees SET
                name = COALESCE($2, name),
                position_id = COALESCE($3, position_id),
                status = COALESCE($4, status),
                phone = COALESCE($5, phone),
                gender = COALESCE($6, gender),
                join_date = COALESCE($7, join_date),
                updated_at = $8
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.position_id)
        .bind(update.status.map(|s| s.as_db()))
        .bind(&update.phone)
        .bind(update.gender.map(|g| g.as_db()))
        .bind(update.join_date)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(self.fetch_employee(id).await?)
    }
}
