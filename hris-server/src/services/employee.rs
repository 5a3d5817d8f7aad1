//! Employees and positions

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Employee, EmployeeCreate, EmployeeFilter, EmployeeStatus, EmployeeUpdate, Position,
    PositionCreate, User, UserRole,
};
use shared::util::now_millis;
use shared::{PageQuery, Paginated};

use super::auth::validate_password;
use crate::db::{EmployeeRepo, NewEmployee, PositionRepo, UserRepo};
use crate::error::ServiceResult;
use crate::identity::IdentityProvider;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::EmployeeNotFound).with_detail("employee_id", id)
}

fn non_empty(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::required(field));
    }
    Ok(value.to_string())
}

pub struct EmployeeService {
    employees: Arc<dyn EmployeeRepo>,
    positions: Arc<dyn PositionRepo>,
    users: Arc<dyn UserRepo>,
    identity: Arc<dyn IdentityProvider>,
}

impl EmployeeService {
    pub fn new(
        employees: Arc<dyn EmployeeRepo>,
        positions: Arc<dyn PositionRepo>,
        users: Arc<dyn UserRepo>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            employees,
            positions,
            users,
            identity,
        }
    }

    pub async fn list(
        &self,
        filter: &EmployeeFilter,
        page: &PageQuery,
    ) -> ServiceResult<Paginated<Employee>> {
        let (items, total) = self.employees.list_employees(filter, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Employee> {
        self.employees
            .find_employee(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Create the record and, when credentials are given, its login account
    pub async fn create(&self, input: EmployeeCreate) -> ServiceResult<Employee> {
        let employee_code = non_empty(&input.employee_code, "employee_code")?;
        let name = non_empty(&input.name, "name")?;
        self.ensure_position(input.position_id).await?;
        if self
            .employees
            .find_employee_by_code(&employee_code)
            .await?
            .is_some()
        {
            return Err(AppError::new(ErrorCode::EmployeeCodeExists)
                .with_detail("employee_code", employee_code)
                .into());
        }

        let user_id = match (input.email.as_deref(), input.password.as_deref()) {
            (Some(email), Some(password)) => {
                let email = non_empty(email, "email")?;
                validate_password(password)?;
                let account = self
                    .identity
                    .create_user(&email, password, input.phone.as_deref())
                    .await?;
                let now = now_millis();
                let user = User {
                    id: account.uid,
                    email,
                    phone: input.phone.clone(),
                    name: name.clone(),
                    company: None,
                    role: UserRole::Employee,
                    created_at: now,
                    updated_at: now,
                };
                Some(self.users.upsert_user(&user).await?.id)
            }
            (None, None) => None,
            _ => {
                return Err(AppError::validation(
                    "email and password must be provided together",
                )
                .into());
            }
        };

        let new = NewEmployee {
            user_id: user_id.clone(),
            employee_code,
            name,
            position_id: input.position_id,
            phone: input.phone,
            gender: input.gender,
            join_date: input.join_date,
        };
        let employee = self.employees.create_employee(&new).await.inspect_err(|e| {
            if let Some(uid) = &user_id {
                tracing::warn!(user_id = %uid, error = %e, "Employee insert failed after account creation");
            }
        })?;

        tracing::info!(
            employee_id = employee.id,
            code = %employee.employee_code,
            has_account = employee.user_id.is_some(),
            "Employee created"
        );
        Ok(employee)
    }

    pub async fn update(&self, id: i64, mut input: EmployeeUpdate) -> ServiceResult<Employee> {
        if let Some(name) = &input.name {
            input.name = Some(non_empty(name, "name")?);
        }
        if let Some(position_id) = input.position_id {
            self.ensure_position(position_id).await?;
        }
        self.employees
            .update_employee(id, &input)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Soft delete: employees are never removed, only marked inactive
    pub async fn deactivate(&self, id: i64) -> ServiceResult<Employee> {
        let update = EmployeeUpdate {
            status: Some(EmployeeStatus::Inactive),
            ..Default::default()
        };
        let employee = self
            .employees
            .update_employee(id, &update)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(employee_id = id, "Employee deactivated");
        Ok(employee)
    }

    pub async fn positions(&self) -> ServiceResult<Vec<Position>> {
        self.positions.list_positions().await
    }

    pub async fn create_position(&self, input: PositionCreate) -> ServiceResult<Position> {
        let name = non_empty(&input.name, "name")?;
        let position = self.positions.create_position(&name).await?;
        tracing::info!(position_id = position.id, name = %position.name, "Position created");
        Ok(position)
    }

    async fn ensure_position(&self, id: i64) -> ServiceResult<()> {
        if self.positions.find_position(id).await?.is_none() {
            return Err(AppError::new(ErrorCode::PositionNotFound)
                .with_detail("position_id", id)
                .into());
        }
        Ok(())
    }
}
