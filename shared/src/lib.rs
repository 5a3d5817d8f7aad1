//! Shared types for the HRIS backend
//!
//! Error codes, domain models, pagination and date helpers used by the
//! server and by API clients.

pub mod date;
pub mod error;
pub mod models;
pub mod pagination;
pub mod util;

pub use date::DateRange;
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use pagination::{PageInfo, PageQuery, Paginated};
