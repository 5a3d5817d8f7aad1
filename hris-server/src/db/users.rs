//! User accounts

use async_trait::async_trait;
use shared::models::{User, UserRole};

use super::{PgRepository, UserRepo};
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    phone: Option<String>,
    name: String,
    company: Option<String>,
    role: String,
    created_at: i64,
    updated_at: i64,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            phone: r.phone,
            name: r.name,
            company: r.company,
            role: UserRole::from_db(&r.role).unwrap_or(UserRole::Employee),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, phone, name, company, role, created_at, updated_at";

#[async_trait]
impl UserRepo for PgRepository {
    async fn find_user(&self, id: &str) -> ServiceResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_phone(&self, phone: &str) -> ServiceResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE phone = $1"))
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn upsert_user(&self, user: &User) -> ServiceResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, email, phone, name, company, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                phone = COALESCE(EXCLUDED.phone, users.phone),
                name = EXCLUDED.name,
                updated_at = EXCLUDED.updated_at
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.name)
        .bind(&user.company)
        .bind(user.role.as_db())
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
