use async_trait::async_trait;
use shared::models::Position;
use shared::util::now_millis;

use super::{PgRepository, PositionRepo};
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct PositionRow {
    id: i64,
    name: String,
    created_at: i64,
}

impl From<PositionRow> for Position {
    fn from(r: PositionRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl PositionRepo for PgRepository {
    async fn list_positions(&self) -> ServiceResult<Vec<Position>> {
        let rows: Vec<PositionRow> =
            sqlx::query_as("SELECT id, name, created_at FROM positions ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_position(&self, id: i64) -> ServiceResult<Option<Position>> {
        let row: Option<PositionRow> =
            sqlx::query_as("SELECT id, name, created_at FROM positions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create_position(&self, name: &str) -> ServiceResult<Position> {
        let row: PositionRow = sqlx::query_as(
            "INSERT INTO positions (name, created_at) VALUES ($1, $2)
             RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
