//! Domain models and request/response payloads
//!
//! Shared between hris-server and API clients.
//! All numeric IDs are `i64` (PostgreSQL BIGSERIAL); user IDs are the
//! identity provider UID. Timestamps are Unix milliseconds.

pub mod attendance;
pub mod checkclock;
pub mod employee;
pub mod leave_request;
pub mod location;
pub mod subscription;
pub mod user;
pub mod work_schedule;

// Re-exports
pub use attendance::*;
pub use checkclock::*;
pub use employee::*;
pub use leave_request::*;
pub use location::*;
pub use subscription::*;
pub use user::*;
pub use work_schedule::*;
