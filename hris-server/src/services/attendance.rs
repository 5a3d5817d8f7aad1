//! Attendance records (read side; rows are written by leave approval)

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{Attendance, AttendanceFilter};
use shared::{PageQuery, Paginated};

use crate::db::AttendanceRepo;
use crate::error::ServiceResult;

pub struct AttendanceService {
    attendances: Arc<dyn AttendanceRepo>,
}

impl AttendanceService {
    pub fn new(attendances: Arc<dyn AttendanceRepo>) -> Self {
        Self { attendances }
    }

    pub async fn list(
        &self,
        filter: &AttendanceFilter,
        page: &PageQuery,
    ) -> ServiceResult<Paginated<Attendance>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(AppError::new(ErrorCode::InvalidDateRange).into());
        }
        let (items, total) = self.attendances.list_attendances(filter, page).await?;
        Ok(Paginated::new(items, total, page))
    }
}
