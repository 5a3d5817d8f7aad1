//! Office locations

use async_trait::async_trait;
use shared::PageQuery;
use shared::models::{Location, LocationCreate, LocationUpdate};
use shared::util::now_millis;

use super::{LocationRepo, PgRepository};
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
pub(super) struct LocationRow {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<LocationRow> for Location {
    fn from(r: LocationRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            address: r.address,
            latitude: r.latitude,
            longitude: r.longitude,
            radius_m: r.radius_m,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const LOCATION_COLUMNS: &str =
    "id, name, address, latitude, longitude, radius_m, created_at, updated_at";

#[async_trait]
impl LocationRepo for PgRepository {
    async fn list_locations(&self, page: &PageQuery) -> ServiceResult<(Vec<Location>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&self.pool)
            .await?;
        let rows: Vec<LocationRow> = sqlx::query_as(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations ORDER BY name, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((rows.into_iter().map(Into::into).collect(), total as u64))
    }

    async fn find_location(&self, id: i64) -> ServiceResult<Option<Location>> {
        let row: Option<LocationRow> = sqlx::query_as(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create_location(&self, location: &LocationCreate) -> ServiceResult<Location> {
        let row: LocationRow = sqlx::query_as(&format!(
            "INSERT INTO locations (name, address, latitude, longitude, radius_m, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(&location.name)
        .bind(&location.address)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.radius_m)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_location(
        &self,
        id: i64,
        update: &LocationUpdate,
    ) -> ServiceResult<Option<Location>> {
        let row: Option<LocationRow> = sqlx::query_as(&format!(
            "UPDATE locations SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                radius_m = COALESCE($6, radius_m),
                updated_at = $7
             WHERE id = $1
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.address)
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(update.radius_m)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_location(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn location_in_use(&self, id: i64) -> ServiceResult<bool> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM work_schedule_details WHERE location_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(in_use)
    }
}
