//! Database access layer
//!
//! One repository trait per aggregate. [`PgRepository`] implements all of
//! them over a PostgreSQL pool; services only see the traits.

pub mod attendances;
pub mod checkclock;
pub mod employees;
pub mod leave_requests;
pub mod locations;
pub mod positions;
pub mod refresh_tokens;
pub mod subscriptions;
pub mod users;
pub mod work_schedules;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::PageQuery;
use shared::models::{
    Attendance, AttendanceFilter, CheckclockSetting, Employee, EmployeeFilter, EmployeeUpdate,
    LeaveRequest, LeaveRequestFilter, LeaveStatus, Location, LocationCreate, LocationUpdate,
    Position, Subscription, SubscriptionPlan, SubscriptionStatus, User, WorkSchedule,
    WorkScheduleDetailDraft, WorkScheduleFilter,
};
use sqlx::PgPool;

use crate::error::ServiceResult;

pub use employees::NewEmployee;
pub use leave_requests::{LeaveDecision, LeaveRequestChanges, LeaveScope, NewLeaveRequest};
pub use subscriptions::NewSubscription;
pub use work_schedules::{NewWorkSchedule, WorkScheduleChanges};

/// PostgreSQL-backed implementation of every repository trait
#[derive(Clone)]
pub struct PgRepository {
    pub pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user(&self, id: &str) -> ServiceResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>>;
    async fn find_user_by_phone(&self, phone: &str) -> ServiceResult<Option<User>>;
    /// Insert or refresh a user keyed by provider UID
    async fn upsert_user(&self, user: &User) -> ServiceResult<User>;
}

#[async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    async fn store_refresh_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: i64,
    ) -> ServiceResult<()>;

    /// Revoke a live token; `false` if unknown, already revoked or expired
    async fn revoke_refresh_token(&self, jti: &str) -> ServiceResult<bool>;
}

#[async_trait]
pub trait PositionRepo: Send + Sync {
    async fn list_positions(&self) -> ServiceResult<Vec<Position>>;
    async fn find_position(&self, id: i64) -> ServiceResult<Option<Position>>;
    async fn create_position(&self, name: &str) -> ServiceResult<Position>;
}

#[async_trait]
pub trait EmployeeRepo: Send + Sync {
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<Employee>, u64)>;
    async fn find_employee(&self, id: i64) -> ServiceResult<Option<Employee>>;
    async fn find_employee_by_code(&self, code: &str) -> ServiceResult<Option<Employee>>;
    async fn find_employee_by_user(&self, user_id: &str) -> ServiceResult<Option<Employee>>;
    async fn create_employee(&self, employee: &NewEmployee) -> ServiceResult<Employee>;
    async fn update_employee(
        &self,
        id: i64,
        update: &EmployeeUpdate,
    ) -> ServiceResult<Option<Employee>>;
}

#[async_trait]
pub trait LeaveRequestRepo: Send + Sync {
    async fn list_leave_requests(
        &self,
        scope: &LeaveScope,
        filter: &LeaveRequestFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<LeaveRequest>, u64)>;

    async fn find_leave_request(&self, id: i64) -> ServiceResult<Option<LeaveRequest>>;

    /// Insert the request and, in the same transaction, one leave attendance
    /// row per entry of `attendance_days` that does not exist yet.
    async fn create_leave_request(
        &self,
        request: &NewLeaveRequest,
        attendance_days: &[NaiveDate],
    ) -> ServiceResult<LeaveRequest>;

    /// Update a pending request; `None` if missing or no longer pending
    async fn update_leave_request(
        &self,
        id: i64,
        changes: &LeaveRequestChanges,
    ) -> ServiceResult<Option<LeaveRequest>>;

    /// Delete a pending request; `false` if missing or no longer pending
    async fn delete_leave_request(&self, id: i64) -> ServiceResult<bool>;

    /// Move a pending request to approved/rejected and materialize attendance
    /// rows atomically; `None` if missing or no longer pending
    async fn decide_leave_request(
        &self,
        id: i64,
        decision: &LeaveDecision,
    ) -> ServiceResult<Option<LeaveRequest>>;
}

#[async_trait]
pub trait AttendanceRepo: Send + Sync {
    async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<Attendance>, u64)>;
}

#[async_trait]
pub trait LocationRepo: Send + Sync {
    async fn list_locations(&self, page: &PageQuery) -> ServiceResult<(Vec<Location>, u64)>;
    async fn find_location(&self, id: i64) -> ServiceResult<Option<Location>>;
    async fn create_location(&self, location: &LocationCreate) -> ServiceResult<Location>;
    async fn update_location(
        &self,
        id: i64,
        update: &LocationUpdate,
    ) -> ServiceResult<Option<Location>>;
    async fn delete_location(&self, id: i64) -> ServiceResult<bool>;
    /// Whether any schedule detail references the location
    async fn location_in_use(&self, id: i64) -> ServiceResult<bool>;
}

#[async_trait]
pub trait WorkScheduleRepo: Send + Sync {
    async fn list_work_schedules(
        &self,
        filter: &WorkScheduleFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<WorkSchedule>, u64)>;

    /// Schedule with details and denormalised locations
    async fn find_work_schedule(&self, id: i64) -> ServiceResult<Option<WorkSchedule>>;

    /// Insert schedule and details in one transaction, returning the new ID
    async fn create_work_schedule(
        &self,
        schedule: &NewWorkSchedule,
        details: &[WorkScheduleDetailDraft],
    ) -> ServiceResult<i64>;

    /// Update parent, upsert `details`, delete `delete_detail_ids` in one
    /// transaction; `false` if the schedule does not exist
    async fn update_work_schedule(
        &self,
        id: i64,
        changes: &WorkScheduleChanges,
        details: &[WorkScheduleDetailDraft],
        delete_detail_ids: &[i64],
    ) -> ServiceResult<bool>;

    async fn delete_work_schedule(&self, id: i64) -> ServiceResult<bool>;

    /// Schedule assigned to an employee through their check-clock setting
    async fn find_schedule_for_employee(
        &self,
        employee_id: i64,
    ) -> ServiceResult<Option<WorkSchedule>>;
}

#[async_trait]
pub trait CheckclockRepo: Send + Sync {
    async fn list_checkclock_settings(
        &self,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<CheckclockSetting>, u64)>;
    async fn find_checkclock_setting(&self, id: i64) -> ServiceResult<Option<CheckclockSetting>>;
    async fn find_checkclock_by_employee(
        &self,
        employee_id: i64,
    ) -> ServiceResult<Option<CheckclockSetting>>;
    async fn create_checkclock_setting(
        &self,
        employee_id: i64,
        work_schedule_id: i64,
    ) -> ServiceResult<CheckclockSetting>;
    async fn update_checkclock_setting(
        &self,
        id: i64,
        work_schedule_id: i64,
    ) -> ServiceResult<Option<CheckclockSetting>>;
    async fn delete_checkclock_setting(&self, id: i64) -> ServiceResult<bool>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn list_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>>;
    async fn find_plan_by_code(&self, code: &str) -> ServiceResult<Option<SubscriptionPlan>>;
    async fn find_subscription(&self, id: i64) -> ServiceResult<Option<Subscription>>;
    async fn find_subscription_by_external_id(
        &self,
        external_id: &str,
    ) -> ServiceResult<Option<Subscription>>;
    /// Most recent subscription of a user, open or not
    async fn find_latest_subscription(&self, user_id: &str)
    -> ServiceResult<Option<Subscription>>;
    async fn find_open_subscription(&self, user_id: &str) -> ServiceResult<Option<Subscription>>;

    /// Insert a subscription; when `close_trial` is set that trial row is
    /// expired in the same transaction
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
        close_trial: Option<i64>,
    ) -> ServiceResult<Subscription>;

    async fn attach_checkout(
        &self,
        id: i64,
        invoice_id: &str,
        checkout_url: &str,
        gateway: &str,
    ) -> ServiceResult<()>;

    async fn mark_paid(&self, id: i64, current_period_end: i64) -> ServiceResult<()>;

    async fn set_subscription_status(
        &self,
        id: i64,
        status: SubscriptionStatus,
        failure_reason: Option<&str>,
    ) -> ServiceResult<()>;

    /// Record a webhook delivery; `false` if it was already processed
    async fn record_webhook_event(&self, invoice_id: &str, event_type: &str)
    -> ServiceResult<bool>;

    /// Drop a recorded delivery whose processing failed, so a retry applies it
    async fn forget_webhook_event(&self, invoice_id: &str, event_type: &str)
    -> ServiceResult<()>;
}

/// Bind-friendly string form for optional leave status filters
pub(crate) fn leave_status_db(status: Option<LeaveStatus>) -> Option<&'static str> {
    status.map(|s| s.as_db())
}

/// `%term%` pattern for ILIKE search, `None` when blank
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
}
