//! Business rules, one service per aggregate
//!
//! Services own validation and orchestration; persistence and outbound
//! calls go through the traits in [`crate::db`], [`crate::storage`],
//! [`crate::email`], [`crate::identity`] and [`crate::payment`].

pub mod attendance;
pub mod auth;
pub mod checkclock;
pub mod employee;
pub mod leave_request;
pub mod location;
pub mod subscription;
pub mod work_schedule;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use checkclock::CheckclockService;
pub use employee::EmployeeService;
pub use leave_request::LeaveRequestService;
pub use location::LocationService;
pub use subscription::{SubscriptionService, WebhookOutcome};
pub use work_schedule::WorkScheduleService;
