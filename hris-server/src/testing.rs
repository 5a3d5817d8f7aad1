//! In-memory repository and recording fakes for service tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use shared::PageQuery;
use shared::error::{AppError, ErrorCode};
use shared::models::*;
use shared::util::now_millis;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{JwtConfig, JwtService};
use crate::config::{Config, GatewayKind};
use crate::db::*;
use crate::email::{EmailError, EmailSender};
use crate::error::{ServiceError, ServiceResult};
use crate::identity::{Credential, IdentityError, IdentityProvider, IdentityUser};
use crate::payment::{CheckoutSession, InvoiceRequest, InvoiceStatus, PaymentError, PaymentGateway};
use crate::state::{AppState, Integrations};
use crate::storage::{ObjectStorage, StorageError};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn jwt() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-with-enough-entropy-0123456789".to_string(),
        access_ttl_minutes: 60,
        refresh_ttl_days: 7,
    })
}

fn injected() -> ServiceError {
    ServiceError::Db("injected database failure".into())
}

fn paginate<T>(items: Vec<T>, page: &PageQuery) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (items, total)
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    /// jti -> (user id, expires at, revoked)
    refresh_tokens: HashMap<String, (String, i64, bool)>,
    positions: Vec<Position>,
    employees: Vec<Employee>,
    leaves: Vec<LeaveRequest>,
    attendances: Vec<Attendance>,
    locations: Vec<Location>,
    schedules: Vec<WorkSchedule>,
    checkclock: Vec<CheckclockSetting>,
    plans: Vec<SubscriptionPlan>,
    subscriptions: Vec<Subscription>,
    webhook_events: HashSet<(String, String)>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_leave_attendance(&mut self, employee_id: i64, leave_id: i64, days: &[NaiveDate]) {
        for day in days {
            let exists = self
                .attendances
                .iter()
                .any(|a| a.employee_id == employee_id && a.date == *day);
            if exists {
                continue;
            }
            let id = self.id();
            self.attendances.push(Attendance {
                id,
                employee_id,
                date: *day,
                status: AttendanceStatus::Leave,
                check_in: None,
                check_out: None,
                leave_request_id: Some(leave_id),
                created_at: now_millis(),
            });
        }
    }

    fn detail_from_draft(
        &mut self,
        schedule_id: i64,
        draft: &WorkScheduleDetailDraft,
    ) -> WorkScheduleDetail {
        let id = match draft.id {
            Some(id) => id,
            None => self.id(),
        };
        WorkScheduleDetail {
            id,
            work_schedule_id: schedule_id,
            work_type: draft.work_type,
            work_days: draft.work_days.clone(),
            check_in_start: draft.check_in_start,
            check_in_end: draft.check_in_end,
            check_out_start: draft.check_out_start,
            check_out_end: draft.check_out_end,
            break_start: draft.break_start,
            break_end: draft.break_end,
            location_id: draft.location_id,
            location: draft
                .location_id
                .and_then(|lid| self.locations.iter().find(|l| l.id == lid).cloned()),
            is_active: draft.is_active,
        }
    }

    fn checkclock_view(&self, mut setting: CheckclockSetting) -> CheckclockSetting {
        setting.employee_name = self
            .employees
            .iter()
            .find(|e| e.id == setting.employee_id)
            .map(|e| e.name.clone());
        setting.work_schedule_name = self
            .schedules
            .iter()
            .find(|s| s.id == setting.work_schedule_id)
            .map(|s| s.name.clone());
        setting
    }
}

/// Every repository trait over plain vectors
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    /// Make leave request writes fail like a broken database
    pub fail_leave_writes: AtomicBool,
    /// Fail a transaction as soon as it would insert attendance rows
    pub fail_attendance_writes: AtomicBool,
    /// Make subscription status changes fail
    pub fail_subscription_writes: AtomicBool,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Empty store with the default plans
    pub fn new() -> Self {
        let repo = Self {
            tables: Mutex::new(Tables::default()),
            fail_leave_writes: AtomicBool::new(false),
            fail_attendance_writes: AtomicBool::new(false),
            fail_subscription_writes: AtomicBool::new(false),
        };
        {
            let mut t = repo.tables();
            for (code, name, price, max, days) in [
                ("trial", "Free Trial", 0, 10, 14),
                ("standard", "Standard", 15_000, 100, 30),
                ("premium", "Premium", 25_000, 1000, 30),
            ] {
                let id = t.id();
                t.plans.push(SubscriptionPlan {
                    id,
                    code: code.to_string(),
                    name: name.to_string(),
                    price_per_seat: price,
                    max_employees: max,
                    period_days: days,
                });
            }
        }
        repo
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    fn leave_writes_fail(&self) -> bool {
        self.fail_leave_writes.load(Ordering::SeqCst)
    }

    /// Whether a write materializing `days` rolls back
    fn attendance_writes_fail(&self, days: &[NaiveDate]) -> bool {
        !days.is_empty() && self.fail_attendance_writes.load(Ordering::SeqCst)
    }

    fn subscription_writes_fail(&self) -> bool {
        self.fail_subscription_writes.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, id: &str, email: &str, role: UserRole) -> User {
        let now = now_millis();
        let user = User {
            id: id.to_string(),
            email: email.to_string(),
            phone: None,
            name: email.split('@').next().unwrap_or(email).to_string(),
            company: None,
            role,
            created_at: now,
            updated_at: now,
        };
        self.tables().users.push(user.clone());
        user
    }

    pub fn add_position(&self, name: &str) -> Position {
        let mut t = self.tables();
        let position = Position {
            id: t.id(),
            name: name.to_string(),
            created_at: now_millis(),
        };
        t.positions.push(position.clone());
        position
    }

    /// Employee under a "Staff" position, created on first use
    pub fn add_employee(&self, code: &str, name: &str, user_id: Option<&str>) -> Employee {
        let position_id = {
            let t = self.tables();
            t.positions.iter().find(|p| p.name == "Staff").map(|p| p.id)
        };
        let position_id = match position_id {
            Some(id) => id,
            None => self.add_position("Staff").id,
        };
        let mut t = self.tables();
        let now = now_millis();
        let employee = Employee {
            id: t.id(),
            user_id: user_id.map(str::to_string),
            employee_code: code.to_string(),
            name: name.to_string(),
            position_id,
            position_name: Some("Staff".to_string()),
            status: EmployeeStatus::Active,
            phone: None,
            gender: None,
            join_date: None,
            created_at: now,
            updated_at: now,
        };
        t.employees.push(employee.clone());
        employee
    }

    pub fn add_location(&self, name: &str) -> Location {
        let mut t = self.tables();
        let now = now_millis();
        let location = Location {
            id: t.id(),
            name: name.to_string(),
            address: None,
            latitude: -6.2,
            longitude: 106.8,
            radius_m: 100,
            created_at: now,
            updated_at: now,
        };
        t.locations.push(location.clone());
        location
    }

    /// WFH schedule working on `days`, assigned to the employee
    pub fn assign_schedule(&self, employee_id: i64, days: &[Weekday]) -> i64 {
        let mut t = self.tables();
        let now = now_millis();
        let schedule_id = t.id();
        let detail_id = t.id();
        t.schedules.push(WorkSchedule {
            id: schedule_id,
            name: format!("Schedule {schedule_id}"),
            work_type: WorkType::Wfh,
            is_active: true,
            details: vec![WorkScheduleDetail {
                id: detail_id,
                work_schedule_id: schedule_id,
                work_type: WorkType::Wfh,
                work_days: days.to_vec(),
                check_in_start: time(8, 0),
                check_in_end: time(9, 0),
                check_out_start: time(17, 0),
                check_out_end: time(18, 0),
                break_start: None,
                break_end: None,
                location_id: None,
                location: None,
                is_active: true,
            }],
            created_at: now,
            updated_at: now,
        });
        let setting_id = t.id();
        t.checkclock.push(CheckclockSetting {
            id: setting_id,
            employee_id,
            employee_name: None,
            work_schedule_id: schedule_id,
            work_schedule_name: None,
            created_at: now,
            updated_at: now,
        });
        schedule_id
    }

    pub fn add_attendance(&self, employee_id: i64, date: NaiveDate, status: AttendanceStatus) {
        let mut t = self.tables();
        let id = t.id();
        t.attendances.push(Attendance {
            id,
            employee_id,
            date,
            status,
            check_in: Some(time(8, 30)),
            check_out: None,
            leave_request_id: None,
            created_at: now_millis(),
        });
    }

    pub fn attendances(&self) -> Vec<Attendance> {
        self.tables().attendances.clone()
    }

    pub fn leave_count(&self) -> usize {
        self.tables().leaves.len()
    }

    pub fn schedule_count(&self) -> usize {
        self.tables().schedules.len()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.tables().subscriptions.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.tables().users.clone()
    }
}

#[async_trait]
impl UserRepo for MemoryRepository {
    async fn find_user(&self, id: &str) -> ServiceResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_phone(&self, phone: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn upsert_user(&self, user: &User) -> ServiceResult<User> {
        let mut t = self.tables();
        if let Some(existing) = t.users.iter_mut().find(|u| u.id == user.id) {
            existing.email = user.email.clone();
            if user.phone.is_some() {
                existing.phone = user.phone.clone();
            }
            existing.name = user.name.clone();
            existing.updated_at = user.updated_at;
            return Ok(existing.clone());
        }
        t.users.push(user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl RefreshTokenRepo for MemoryRepository {
    async fn store_refresh_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: i64,
    ) -> ServiceResult<()> {
        self.tables()
            .refresh_tokens
            .insert(jti.to_string(), (user_id.to_string(), expires_at, false));
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> ServiceResult<bool> {
        let now = now_millis();
        let mut t = self.tables();
        match t.refresh_tokens.get_mut(jti) {
            Some((_, expires_at, revoked)) if !*revoked && *expires_at > now => {
                *revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl PositionRepo for MemoryRepository {
    async fn list_positions(&self) -> ServiceResult<Vec<Position>> {
        let mut positions = self.tables().positions.clone();
        positions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(positions)
    }

    async fn find_position(&self, id: i64) -> ServiceResult<Option<Position>> {
        Ok(self.tables().positions.iter().find(|p| p.id == id).cloned())
    }

    async fn create_position(&self, name: &str) -> ServiceResult<Position> {
        Ok(self.add_position(name))
    }
}

#[async_trait]
impl EmployeeRepo for MemoryRepository {
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<Employee>, u64)> {
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let mut matching: Vec<Employee> = self
            .tables()
            .employees
            .iter()
            .filter(|e| filter.status.is_none_or(|s| s == e.status))
            .filter(|e| filter.position_id.is_none_or(|p| p == e.position_id))
            .filter(|e| {
                search.as_deref().is_none_or(|s| {
                    e.name.to_lowercase().contains(s) || e.employee_code.to_lowercase().contains(s)
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn find_employee(&self, id: i64) -> ServiceResult<Option<Employee>> {
        Ok(self.tables().employees.iter().find(|e| e.id == id).cloned())
    }

    async fn find_employee_by_code(&self, code: &str) -> ServiceResult<Option<Employee>> {
        Ok(self
            .tables()
            .employees
            .iter()
            .find(|e| e.employee_code == code)
            .cloned())
    }

    async fn find_employee_by_user(&self, user_id: &str) -> ServiceResult<Option<Employee>> {
        Ok(self
            .tables()
            .employees
            .iter()
            .find(|e| e.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn create_employee(&self, employee: &NewEmployee) -> ServiceResult<Employee> {
        let mut t = self.tables();
        if t.employees
            .iter()
            .any(|e| e.employee_code == employee.employee_code)
        {
            return Err(AppError::new(ErrorCode::EmployeeCodeExists).into());
        }
        let position_name = t
            .positions
            .iter()
            .find(|p| p.id == employee.position_id)
            .map(|p| p.name.clone());
        let now = now_millis();
        let created = Employee {
            id: t.id(),
            user_id: employee.user_id.clone(),
            employee_code: employee.employee_code.clone(),
            name: employee.name.clone(),
            position_id: employee.position_id,
            position_name,
            status: EmployeeStatus::Active,
            phone: employee.phone.clone(),
            gender: employee.gender,
            join_date: employee.join_date,
            created_at: now,
            updated_at: now,
        };
        t.employees.push(created.clone());
        Ok(created)
    }

    async fn update_employee(
        &self,
        id: i64,
        update: &EmployeeUpdate,
    ) -> ServiceResult<Option<Employee>> {
        let mut t = self.tables();
        let position_name = update.position_id.and_then(|pid| {
            t.positions
                .iter()
                .find(|p| p.id == pid)
                .map(|p| p.name.clone())
        });
        let Some(employee) = t.employees.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            employee.name = name.clone();
        }
        if let Some(position_id) = update.position_id {
            employee.position_id = position_id;
            employee.position_name = position_name;
        }
        if let Some(status) = update.status {
            employee.status = status;
        }
        if update.phone.is_some() {
            employee.phone = update.phone.clone();
        }
        if update.gender.is_some() {
            employee.gender = update.gender;
        }
        if update.join_date.is_some() {
            employee.join_date = update.join_date;
        }
        employee.updated_at = now_millis();
        Ok(Some(employee.clone()))
    }
}

#[async_trait]
impl LeaveRequestRepo for MemoryRepository {
    async fn list_leave_requests(
        &self,
        scope: &LeaveScope,
        filter: &LeaveRequestFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<LeaveRequest>, u64)> {
        let t = self.tables();
        let in_scope = |l: &LeaveRequest| match scope {
            LeaveScope::All => true,
            LeaveScope::Employee(id) => l.employee_id == *id,
            LeaveScope::User(uid) => t
                .employees
                .iter()
                .any(|e| e.id == l.employee_id && e.user_id.as_deref() == Some(uid.as_str())),
        };
        let mut matching: Vec<LeaveRequest> = t
            .leaves
            .iter()
            .filter(|l| in_scope(l) && filter.matches(l))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(matching, page))
    }

    async fn find_leave_request(&self, id: i64) -> ServiceResult<Option<LeaveRequest>> {
        Ok(self.tables().leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn create_leave_request(
        &self,
        request: &NewLeaveRequest,
        attendance_days: &[NaiveDate],
    ) -> ServiceResult<LeaveRequest> {
        if self.leave_writes_fail() || self.attendance_writes_fail(attendance_days) {
            return Err(injected());
        }
        let mut t = self.tables();
        let employee_name = t
            .employees
            .iter()
            .find(|e| e.id == request.employee_id)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        let now = now_millis();
        let created = LeaveRequest {
            id: t.id(),
            employee_id: request.employee_id,
            employee_name,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            status: request.status,
            attachment_key: request.attachment_key.clone(),
            employee_note: request.employee_note.clone(),
            admin_note: request.admin_note.clone(),
            created_at: now,
            updated_at: now,
        };
        t.leaves.push(created.clone());
        t.insert_leave_attendance(created.employee_id, created.id, attendance_days);
        Ok(created)
    }

    async fn update_leave_request(
        &self,
        id: i64,
        changes: &LeaveRequestChanges,
    ) -> ServiceResult<Option<LeaveRequest>> {
        if self.leave_writes_fail() {
            return Err(injected());
        }
        let mut t = self.tables();
        let Some(leave) = t
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.status.is_pending())
        else {
            return Ok(None);
        };
        leave.leave_type = changes.leave_type;
        leave.start_date = changes.start_date;
        leave.end_date = changes.end_date;
        leave.attachment_key = changes.attachment_key.clone();
        leave.employee_note = changes.employee_note.clone();
        leave.updated_at = now_millis();
        Ok(Some(leave.clone()))
    }

    async fn delete_leave_request(&self, id: i64) -> ServiceResult<bool> {
        if self.leave_writes_fail() {
            return Err(injected());
        }
        let mut t = self.tables();
        let before = t.leaves.len();
        t.leaves.retain(|l| !(l.id == id && l.status.is_pending()));
        Ok(t.leaves.len() < before)
    }

    async fn decide_leave_request(
        &self,
        id: i64,
        decision: &LeaveDecision,
    ) -> ServiceResult<Option<LeaveRequest>> {
        if self.leave_writes_fail() || self.attendance_writes_fail(&decision.attendance_days) {
            return Err(injected());
        }
        let mut t = self.tables();
        let Some(leave) = t
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.status.is_pending())
        else {
            return Ok(None);
        };
        leave.status = decision.status;
        leave.admin_note = decision.admin_note.clone();
        leave.updated_at = now_millis();
        let decided = leave.clone();
        t.insert_leave_attendance(decided.employee_id, decided.id, &decision.attendance_days);
        Ok(Some(decided))
    }
}

#[async_trait]
impl AttendanceRepo for MemoryRepository {
    async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<Attendance>, u64)> {
        let mut matching: Vec<Attendance> = self
            .tables()
            .attendances
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(a.employee_id.cmp(&b.employee_id))
        });
        Ok(paginate(matching, page))
    }
}

#[async_trait]
impl LocationRepo for MemoryRepository {
    async fn list_locations(&self, page: &PageQuery) -> ServiceResult<(Vec<Location>, u64)> {
        let mut locations = self.tables().locations.clone();
        locations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(locations, page))
    }

    async fn find_location(&self, id: i64) -> ServiceResult<Option<Location>> {
        Ok(self.tables().locations.iter().find(|l| l.id == id).cloned())
    }

    async fn create_location(&self, location: &LocationCreate) -> ServiceResult<Location> {
        let mut t = self.tables();
        let now = now_millis();
        let created = Location {
            id: t.id(),
            name: location.name.clone(),
            address: location.address.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            radius_m: location.radius_m,
            created_at: now,
            updated_at: now,
        };
        t.locations.push(created.clone());
        Ok(created)
    }

    async fn update_location(
        &self,
        id: i64,
        update: &LocationUpdate,
    ) -> ServiceResult<Option<Location>> {
        let mut t = self.tables();
        let Some(location) = t.locations.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            location.name = name.clone();
        }
        if update.address.is_some() {
            location.address = update.address.clone();
        }
        if let Some(latitude) = update.latitude {
            location.latitude = latitude;
        }
        if let Some(longitude) = update.longitude {
            location.longitude = longitude;
        }
        if let Some(radius_m) = update.radius_m {
            location.radius_m = radius_m;
        }
        location.updated_at = now_millis();
        Ok(Some(location.clone()))
    }

    async fn delete_location(&self, id: i64) -> ServiceResult<bool> {
        let mut t = self.tables();
        let before = t.locations.len();
        t.locations.retain(|l| l.id != id);
        Ok(t.locations.len() < before)
    }

    async fn location_in_use(&self, id: i64) -> ServiceResult<bool> {
        Ok(self
            .tables()
            .schedules
            .iter()
            .flat_map(|s| s.details.iter())
            .any(|d| d.location_id == Some(id)))
    }
}

#[async_trait]
impl WorkScheduleRepo for MemoryRepository {
    async fn list_work_schedules(
        &self,
        filter: &WorkScheduleFilter,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<WorkSchedule>, u64)> {
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let mut matching: Vec<WorkSchedule> = self
            .tables()
            .schedules
            .iter()
            .filter(|s| {
                search
                    .as_deref()
                    .is_none_or(|q| s.name.to_lowercase().contains(q))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn find_work_schedule(&self, id: i64) -> ServiceResult<Option<WorkSchedule>> {
        Ok(self.tables().schedules.iter().find(|s| s.id == id).cloned())
    }

    async fn create_work_schedule(
        &self,
        schedule: &NewWorkSchedule,
        details: &[WorkScheduleDetailDraft],
    ) -> ServiceResult<i64> {
        let mut t = self.tables();
        let id = t.id();
        let details = details
            .iter()
            .map(|d| t.detail_from_draft(id, d))
            .collect();
        let now = now_millis();
        t.schedules.push(WorkSchedule {
            id,
            name: schedule.name.clone(),
            work_type: schedule.work_type,
            is_active: schedule.is_active,
            details,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_work_schedule(
        &self,
        id: i64,
        changes: &WorkScheduleChanges,
        details: &[WorkScheduleDetailDraft],
        delete_detail_ids: &[i64],
    ) -> ServiceResult<bool> {
        let mut t = self.tables();
        let Some(index) = t.schedules.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        if let Some(foreign) = details
            .iter()
            .filter_map(|d| d.id)
            .find(|did| !t.schedules[index].details.iter().any(|d| d.id == *did))
        {
            return Err(AppError::new(ErrorCode::WorkScheduleDetailInvalid)
                .with_detail("detail_id", foreign)
                .into());
        }

        let built: Vec<WorkScheduleDetail> = details
            .iter()
            .map(|d| t.detail_from_draft(id, d))
            .collect();
        let schedule = &mut t.schedules[index];
        if let Some(name) = &changes.name {
            schedule.name = name.clone();
        }
        if let Some(work_type) = changes.work_type {
            schedule.work_type = work_type;
        }
        if let Some(is_active) = changes.is_active {
            schedule.is_active = is_active;
        }
        for detail in built {
            match schedule.details.iter_mut().find(|d| d.id == detail.id) {
                Some(existing) => *existing = detail,
                None => schedule.details.push(detail),
            }
        }
        schedule
            .details
            .retain(|d| !delete_detail_ids.contains(&d.id));
        schedule.updated_at = now_millis();
        Ok(true)
    }

    async fn delete_work_schedule(&self, id: i64) -> ServiceResult<bool> {
        let mut t = self.tables();
        let before = t.schedules.len();
        t.schedules.retain(|s| s.id != id);
        t.checkclock.retain(|c| c.work_schedule_id != id);
        Ok(t.schedules.len() < before)
    }

    async fn find_schedule_for_employee(
        &self,
        employee_id: i64,
    ) -> ServiceResult<Option<WorkSchedule>> {
        let t = self.tables();
        Ok(t.checkclock
            .iter()
            .find(|c| c.employee_id == employee_id)
            .and_then(|c| t.schedules.iter().find(|s| s.id == c.work_schedule_id))
            .cloned())
    }
}

#[async_trait]
impl CheckclockRepo for MemoryRepository {
    async fn list_checkclock_settings(
        &self,
        page: &PageQuery,
    ) -> ServiceResult<(Vec<CheckclockSetting>, u64)> {
        let t = self.tables();
        let settings = t
            .checkclock
            .iter()
            .cloned()
            .map(|c| t.checkclock_view(c))
            .collect();
        Ok(paginate(settings, page))
    }

    async fn find_checkclock_setting(&self, id: i64) -> ServiceResult<Option<CheckclockSetting>> {
        let t = self.tables();
        Ok(t.checkclock
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| t.checkclock_view(c)))
    }

    async fn find_checkclock_by_employee(
        &self,
        employee_id: i64,
    ) -> ServiceResult<Option<CheckclockSetting>> {
        let t = self.tables();
        Ok(t.checkclock
            .iter()
            .find(|c| c.employee_id == employee_id)
            .cloned()
            .map(|c| t.checkclock_view(c)))
    }

    async fn create_checkclock_setting(
        &self,
        employee_id: i64,
        work_schedule_id: i64,
    ) -> ServiceResult<CheckclockSetting> {
        let mut t = self.tables();
        if t.checkclock.iter().any(|c| c.employee_id == employee_id) {
            return Err(AppError::new(ErrorCode::CheckclockSettingExists).into());
        }
        let now = now_millis();
        let setting = CheckclockSetting {
            id: t.id(),
            employee_id,
            employee_name: None,
            work_schedule_id,
            work_schedule_name: None,
            created_at: now,
            updated_at: now,
        };
        t.checkclock.push(setting.clone());
        Ok(t.checkclock_view(setting))
    }

    async fn update_checkclock_setting(
        &self,
        id: i64,
        work_schedule_id: i64,
    ) -> ServiceResult<Option<CheckclockSetting>> {
        let mut t = self.tables();
        let Some(setting) = t.checkclock.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        setting.work_schedule_id = work_schedule_id;
        setting.updated_at = now_millis();
        let setting = setting.clone();
        Ok(Some(t.checkclock_view(setting)))
    }

    async fn delete_checkclock_setting(&self, id: i64) -> ServiceResult<bool> {
        let mut t = self.tables();
        let before = t.checkclock.len();
        t.checkclock.retain(|c| c.id != id);
        Ok(t.checkclock.len() < before)
    }
}

#[async_trait]
impl SubscriptionRepo for MemoryRepository {
    async fn list_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        let mut plans = self.tables().plans.clone();
        plans.sort_by_key(|p| (p.price_per_seat, p.id));
        Ok(plans)
    }

    async fn find_plan_by_code(&self, code: &str) -> ServiceResult<Option<SubscriptionPlan>> {
        Ok(self.tables().plans.iter().find(|p| p.code == code).cloned())
    }

    async fn find_subscription(&self, id: i64) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .tables()
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_subscription_by_external_id(
        &self,
        external_id: &str,
    ) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .tables()
            .subscriptions
            .iter()
            .find(|s| s.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_latest_subscription(
        &self,
        user_id: &str,
    ) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .tables()
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.created_at, s.id))
            .cloned())
    }

    async fn find_open_subscription(&self, user_id: &str) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .tables()
            .subscriptions
            .iter()
            .find(|s| s.user_id == user_id && s.status.is_open())
            .cloned())
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
        close_trial: Option<i64>,
    ) -> ServiceResult<Subscription> {
        let mut t = self.tables();
        let now = now_millis();
        if let Some(trial_id) = close_trial {
            for trial in t
                .subscriptions
                .iter_mut()
                .filter(|s| s.id == trial_id && s.status == SubscriptionStatus::Trial)
            {
                trial.status = SubscriptionStatus::Expired;
                trial.updated_at = now;
            }
        }
        if subscription.status.is_open()
            && t.subscriptions
                .iter()
                .any(|s| s.user_id == subscription.user_id && s.status.is_open())
        {
            return Err(AppError::new(ErrorCode::SubscriptionExists).into());
        }
        let plan_code = t
            .plans
            .iter()
            .find(|p| p.id == subscription.plan_id)
            .map(|p| p.code.clone())
            .unwrap_or_default();
        let created = Subscription {
            id: t.id(),
            user_id: subscription.user_id.clone(),
            plan_id: subscription.plan_id,
            plan_code,
            seats: subscription.seats,
            amount: subscription.amount,
            status: subscription.status,
            trial_ends_at: subscription.trial_ends_at,
            current_period_end: None,
            external_id: subscription.external_id.clone(),
            invoice_id: None,
            checkout_url: None,
            gateway: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        t.subscriptions.push(created.clone());
        Ok(created)
    }

    async fn attach_checkout(
        &self,
        id: i64,
        invoice_id: &str,
        checkout_url: &str,
        gateway: &str,
    ) -> ServiceResult<()> {
        if let Some(s) = self.tables().subscriptions.iter_mut().find(|s| s.id == id) {
            s.invoice_id = Some(invoice_id.to_string());
            s.checkout_url = Some(checkout_url.to_string());
            s.gateway = Some(gateway.to_string());
        }
        Ok(())
    }

    async fn mark_paid(&self, id: i64, current_period_end: i64) -> ServiceResult<()> {
        if self.subscription_writes_fail() {
            return Err(injected());
        }
        if let Some(s) = self.tables().subscriptions.iter_mut().find(|s| s.id == id) {
            s.status = SubscriptionStatus::Active;
            s.current_period_end = Some(current_period_end);
            s.failure_reason = None;
        }
        Ok(())
    }

    async fn set_subscription_status(
        &self,
        id: i64,
        status: SubscriptionStatus,
        failure_reason: Option<&str>,
    ) -> ServiceResult<()> {
        if self.subscription_writes_fail() {
            return Err(injected());
        }
        if let Some(s) = self.tables().subscriptions.iter_mut().find(|s| s.id == id) {
            s.status = status;
            s.failure_reason = failure_reason.map(str::to_string);
        }
        Ok(())
    }

    async fn record_webhook_event(
        &self,
        invoice_id: &str,
        event_type: &str,
    ) -> ServiceResult<bool> {
        Ok(self
            .tables()
            .webhook_events
            .insert((invoice_id.to_string(), event_type.to_string())))
    }

    async fn forget_webhook_event(&self, invoice_id: &str, event_type: &str) -> ServiceResult<()> {
        self.tables()
            .webhook_events
            .remove(&(invoice_id.to_string(), event_type.to_string()));
        Ok(())
    }
}

/// Object storage keeping uploads in a map
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    pub fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        _bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("bucket unavailable".to_string()));
        }
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, _bucket: &str, keys: &[String]) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().unwrap();
        let mut deleted = self.deleted.lock().unwrap();
        for key in keys {
            objects.remove(key);
            deleted.push(key.clone());
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://files.test/{bucket}/{key}")
    }
}

/// Email sender recording `(to, subject)`
#[derive(Default)]
pub struct RecordingEmail {
    sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl RecordingEmail {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError("mailbox unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Identity provider holding accounts in memory
#[derive(Default)]
pub struct FakeIdentity {
    /// uid -> (account, password)
    accounts: Mutex<HashMap<String, (IdentityUser, String)>>,
    /// Google ID token -> account
    id_tokens: Mutex<HashMap<String, IdentityUser>>,
    resets: Mutex<Vec<String>>,
    pub fail_resets: AtomicBool,
}

impl FakeIdentity {
    pub fn add_account(&self, uid: &str, email: &str, phone: Option<&str>, password: &str) {
        let user = IdentityUser {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            phone: phone.map(str::to_string),
            name: None,
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(uid.to_string(), (user, password.to_string()));
    }

    pub fn add_id_token(&self, token: &str, uid: &str, email: &str, name: &str) {
        self.id_tokens.lock().unwrap().insert(
            token.to_string(),
            IdentityUser {
                uid: uid.to_string(),
                email: Some(email.to_string()),
                phone: None,
                name: Some(name.to_string()),
            },
        );
    }

    pub fn password_of(&self, uid: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(uid)
            .map(|(_, p)| p.clone())
    }

    pub fn resets(&self) -> Vec<String> {
        self.resets.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_credentials(
        &self,
        credential: Credential<'_>,
        password: &str,
    ) -> Result<IdentityUser, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        accounts
            .values()
            .find(|(user, _)| match credential {
                Credential::Email(email) => user
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email)),
                Credential::Phone(phone) => user.phone.as_deref() == Some(phone),
            })
            .filter(|(_, stored)| stored == password)
            .map(|(user, _)| user.clone())
            .ok_or(IdentityError::InvalidCredentials)
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<IdentityUser, IdentityError> {
        self.id_tokens
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<IdentityUser, IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|(u, _)| {
            u.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        }) {
            return Err(IdentityError::AlreadyExists);
        }
        let user = IdentityUser {
            uid: format!("uid-{}", accounts.len() + 1),
            email: Some(email.to_string()),
            phone: phone.map(str::to_string),
            name: None,
        };
        accounts.insert(user.uid.clone(), (user.clone(), password.to_string()));
        Ok(user)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        if self.fail_resets.load(Ordering::SeqCst) {
            return Err(IdentityError::Provider("smtp relay down".to_string()));
        }
        self.resets.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError> {
        match self.accounts.lock().unwrap().get_mut(uid) {
            Some((_, password)) => {
                *password = new_password.to_string();
                Ok(())
            }
            None => Err(IdentityError::Provider(format!("unknown user {uid}"))),
        }
    }
}

/// Gateway returning canned sessions and statuses
pub struct FakeGateway {
    requests: Mutex<Vec<InvoiceRequest>>,
    status: Mutex<InvoiceStatus>,
    pub fail_checkout: AtomicBool,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            status: Mutex::new(InvoiceStatus::Pending),
            fail_checkout: AtomicBool::new(false),
        }
    }
}

impl FakeGateway {
    pub fn requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn set_status(&self, status: InvoiceStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_checkout(
        &self,
        request: &InvoiceRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if self.fail_checkout.load(Ordering::SeqCst) {
            return Err(PaymentError::Gateway("invoice rejected".to_string()));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            invoice_id: format!("inv-{}", request.external_id),
            checkout_url: format!("https://pay.test/{}", request.external_id),
        })
    }

    async fn get_status(
        &self,
        _external_id: &str,
        _invoice_id: &str,
    ) -> Result<InvoiceStatus, PaymentError> {
        Ok(self.status.lock().unwrap().clone())
    }
}

/// Repository plus fakes, shared by service tests
pub struct Fixture {
    pub repo: Arc<MemoryRepository>,
    pub storage: Arc<MemoryStorage>,
    pub email: Arc<RecordingEmail>,
    pub identity: Arc<FakeIdentity>,
    pub gateway: Arc<FakeGateway>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            repo: Arc::new(MemoryRepository::new()),
            storage: Arc::new(MemoryStorage::default()),
            email: Arc::new(RecordingEmail::default()),
            identity: Arc::new(FakeIdentity::default()),
            gateway: Arc::new(FakeGateway::default()),
        }
    }
}

pub const CALLBACK_KEY: &str = "test-callback-key";

pub fn config() -> Config {
    Config {
        database_url: "postgres://localhost/hris_test".to_string(),
        http_port: 0,
        environment: "development".to_string(),
        jwt_secret: "test-secret-with-enough-entropy-0123456789".to_string(),
        jwt_access_ttl_minutes: 60,
        jwt_refresh_ttl_days: 7,
        identity_url: "http://identity.test".to_string(),
        identity_api_key: "test".to_string(),
        storage_bucket: "hris-test".to_string(),
        storage_public_base_url: "https://files.test".to_string(),
        ses_from_email: "noreply@hris.test".to_string(),
        payment_gateway: GatewayKind::Xendit,
        xendit_secret_key: "test".to_string(),
        xendit_callback_token: CALLBACK_KEY.to_string(),
        midtrans_server_key: String::new(),
        midtrans_production: false,
        checkout_success_url: "https://app.test/ok".to_string(),
        checkout_failure_url: "https://app.test/failed".to_string(),
        log_format: "text".to_string(),
    }
}

impl Fixture {
    /// Full application state over the fixture; the pool never connects
    pub fn app_state(&self) -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy(&config().database_url)
            .unwrap();
        let integrations = Integrations {
            storage: self.storage.clone(),
            email: self.email.clone(),
            identity: self.identity.clone(),
            gateway: self.gateway.clone(),
        };
        AppState::assemble(pool, self.repo.clone(), integrations, &config())
    }
}
