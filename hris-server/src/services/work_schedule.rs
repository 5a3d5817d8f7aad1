//! Work schedule configuration
//!
//! A schedule and its details are written as one unit. Office (WFO) details
//! must point at an existing location before anything is persisted.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    WorkSchedule, WorkScheduleCreate, WorkScheduleDetailDraft, WorkScheduleDetailInput,
    WorkScheduleFilter, WorkScheduleResponse, WorkScheduleUpdate,
};
use shared::{AppResult, PageQuery, Paginated};

use crate::db::{LocationRepo, NewWorkSchedule, WorkScheduleChanges, WorkScheduleRepo};
use crate::error::ServiceResult;

fn invalid_detail(index: usize, message: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::WorkScheduleDetailInvalid, message).with_detail("detail", index)
}

/// Shape checks that need no database
pub fn validate_detail(index: usize, detail: &WorkScheduleDetailDraft) -> AppResult<()> {
    if detail.work_days.is_empty() {
        return Err(invalid_detail(index, "work_days must not be empty"));
    }
    if detail.check_in_start > detail.check_in_end {
        return Err(invalid_detail(
            index,
            "check_in_start must not be after check_in_end",
        ));
    }
    if detail.check_out_start > detail.check_out_end {
        return Err(invalid_detail(
            index,
            "check_out_start must not be after check_out_end",
        ));
    }
    match (detail.break_start, detail.break_end) {
        (Some(start), Some(end)) if start > end => Err(invalid_detail(
            index,
            "break_start must not be after break_end",
        )),
        (Some(_), None) | (None, Some(_)) => Err(invalid_detail(
            index,
            "break_start and break_end must be set together",
        )),
        _ => Ok(()),
    }
}

fn parse_details(inputs: &[WorkScheduleDetailInput]) -> AppResult<Vec<WorkScheduleDetailDraft>> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let draft = input.to_draft()?;
            validate_detail(i, &draft)?;
            Ok(draft)
        })
        .collect()
}

fn require_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::required("name"));
    }
    Ok(name.to_string())
}

pub struct WorkScheduleService {
    schedules: Arc<dyn WorkScheduleRepo>,
    locations: Arc<dyn LocationRepo>,
}

impl WorkScheduleService {
    pub fn new(schedules: Arc<dyn WorkScheduleRepo>, locations: Arc<dyn LocationRepo>) -> Self {
        Self {
            schedules,
            locations,
        }
    }

    pub async fn create(&self, input: WorkScheduleCreate) -> ServiceResult<WorkScheduleResponse> {
        let name = require_name(&input.name)?;
        let details = parse_details(&input.details)?;
        self.check_locations(&details).await?;

        let schedule = NewWorkSchedule {
            name,
            work_type: input.work_type,
            is_active: input.is_active,
        };
        let id = self
            .schedules
            .create_work_schedule(&schedule, &details)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create work schedule"))?;

        tracing::info!(schedule_id = id, details = details.len(), "Work schedule created");
        Ok(self.find(id).await?.into())
    }

    pub async fn update(
        &self,
        id: i64,
        input: WorkScheduleUpdate,
    ) -> ServiceResult<WorkScheduleResponse> {
        self.find(id).await?;

        let name = input.name.as_deref().map(require_name).transpose()?;
        let details = parse_details(&input.details)?;
        self.check_locations(&details).await?;

        let changes = WorkScheduleChanges {
            name,
            work_type: input.work_type,
            is_active: input.is_active,
        };
        let updated = self
            .schedules
            .update_work_schedule(id, &changes, &details, &input.delete_detail_ids)
            .await
            .inspect_err(|e| tracing::error!(schedule_id = id, error = %e, "failed to update work schedule"))?;
        if !updated {
            return Err(not_found(id).into());
        }

        tracing::info!(
            schedule_id = id,
            upserted = details.len(),
            deleted = input.delete_detail_ids.len(),
            "Work schedule updated"
        );
        Ok(self.find(id).await?.into())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.schedules.delete_work_schedule(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(schedule_id = id, "Work schedule deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> ServiceResult<WorkScheduleResponse> {
        Ok(self.find(id).await?.into())
    }

    pub async fn list(
        &self,
        filter: &WorkScheduleFilter,
        page: &PageQuery,
    ) -> ServiceResult<Paginated<WorkScheduleResponse>> {
        let (items, total) = self.schedules.list_work_schedules(filter, page).await?;
        Ok(Paginated::new(items, total, page).map(Into::into))
    }

    async fn find(&self, id: i64) -> ServiceResult<WorkSchedule> {
        self.schedules
            .find_work_schedule(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Every WFO detail needs a location; every referenced location must exist
    async fn check_locations(&self, details: &[WorkScheduleDetailDraft]) -> ServiceResult<()> {
        for (index, detail) in details.iter().enumerate() {
            let Some(location_id) = detail.location_id else {
                if detail.work_type.requires_location() {
                    return Err(AppError::with_message(
                        ErrorCode::LocationRequired,
                        "WFO schedule details require a location",
                    )
                    .with_detail("detail", index)
                    .into());
                }
                continue;
            };
            if self.locations.find_location(location_id).await?.is_none() {
                return Err(AppError::new(ErrorCode::LocationNotFound)
                    .with_detail("location_id", location_id)
                    .with_detail("detail", index)
                    .into());
            }
        }
        Ok(())
    }
}

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::WorkScheduleNotFound).with_detail("work_schedule_id", id)
}
