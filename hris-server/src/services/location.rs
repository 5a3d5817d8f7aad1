//! Office locations

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{Location, LocationCreate, LocationUpdate, validate_geofence};
use shared::{PageQuery, Paginated};

use crate::db::LocationRepo;
use crate::error::ServiceResult;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::LocationNotFound).with_detail("location_id", id)
}

pub struct LocationService {
    locations: Arc<dyn LocationRepo>,
}

impl LocationService {
    pub fn new(locations: Arc<dyn LocationRepo>) -> Self {
        Self { locations }
    }

    pub async fn list(&self, page: &PageQuery) -> ServiceResult<Paginated<Location>> {
        let (items, total) = self.locations.list_locations(page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Location> {
        self.locations
            .find_location(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    pub async fn create(&self, mut input: LocationCreate) -> ServiceResult<Location> {
        input.name = input.name.trim().to_string();
        if input.name.is_empty() {
            return Err(AppError::required("name").into());
        }
        validate_geofence(input.latitude, input.longitude, input.radius_m)?;

        let location = self.locations.create_location(&input).await?;
        tracing::info!(location_id = location.id, name = %location.name, "Location created");
        Ok(location)
    }

    pub async fn update(&self, id: i64, mut input: LocationUpdate) -> ServiceResult<Location> {
        let current = self.get(id).await?;
        if let Some(name) = &mut input.name {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::required("name").into());
            }
        }
        validate_geofence(
            input.latitude.unwrap_or(current.latitude),
            input.longitude.unwrap_or(current.longitude),
            input.radius_m.unwrap_or(current.radius_m),
        )?;

        self.locations
            .update_location(id, &input)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Locations referenced by a schedule detail cannot be removed
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        if self.locations.location_in_use(id).await? {
            return Err(AppError::with_message(
                ErrorCode::LocationInUse,
                "Location is used by a work schedule",
            )
            .with_detail("location_id", id)
            .into());
        }
        if !self.locations.delete_location(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(location_id = id, "Location deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::testing::Fixture;

    fn hq() -> LocationCreate {
        LocationCreate {
            name: " Jakarta HQ ".to_string(),
            address: Some("Jl. Sudirman 1".to_string()),
            latitude: -6.2088,
            longitude: 106.8456,
            radius_m: 150,
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_validates() {
        let fx = Fixture::new();
        let svc = LocationService::new(fx.repo.clone());

        let created = svc.create(hq()).await.unwrap();
        assert_eq!(created.name, "Jakarta HQ");

        let mut bad = hq();
        bad.radius_m = 0;
        let err = svc.create(bad).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValueOutOfRange));

        let mut unnamed = hq();
        unnamed.name = "  ".to_string();
        let err = svc.create(unnamed).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::RequiredField));
    }

    #[tokio::test]
    async fn test_update_checks_merged_coordinates() {
        let fx = Fixture::new();
        let svc = LocationService::new(fx.repo.clone());
        let created = svc.create(hq()).await.unwrap();

        let err = svc
            .update(
                created.id,
                LocationUpdate {
                    latitude: Some(91.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValueOutOfRange));

        let updated = svc
            .update(
                created.id,
                LocationUpdate {
                    radius_m: Some(300),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.radius_m, 300);
        assert_eq!(updated.latitude, created.latitude);
    }

    #[tokio::test]
    async fn test_delete_referenced_location_conflicts() {
        let fx = Fixture::new();
        let svc = LocationService::new(fx.repo.clone());
        let used = fx.repo.add_location("Branch");
        let employee = fx.repo.add_employee("EMP001", "Ani", None);
        let schedule_id = fx.repo.assign_schedule(employee.id, &[Weekday::Mon]);
        let schedules = crate::services::WorkScheduleService::new(fx.repo.clone(), fx.repo.clone());
        let mut detail = schedules.get(schedule_id).await.unwrap().details[0].clone();
        detail.location_id = Some(used.id);
        schedules
            .update(
                schedule_id,
                shared::models::WorkScheduleUpdate {
                    details: vec![shared::models::WorkScheduleDetailInput {
                        id: Some(detail.id),
                        work_type: detail.work_type,
                        work_days: detail.work_days,
                        check_in_start: detail.check_in_start,
                        check_in_end: detail.check_in_end,
                        check_out_start: detail.check_out_start,
                        check_out_end: detail.check_out_end,
                        break_start: None,
                        break_end: None,
                        location_id: detail.location_id,
                        is_active: true,
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = svc.delete(used.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::LocationInUse));

        let free = fx.repo.add_location("Warehouse");
        svc.delete(free.id).await.unwrap();
        let err = svc.get(free.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::LocationNotFound));
    }
}
