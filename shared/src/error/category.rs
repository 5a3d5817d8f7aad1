//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category, derived from the leading digit of the error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Employee errors (3xxx)
    Employee,
    /// Leave request errors (4xxx)
    Leave,
    /// Work schedule / check-clock errors (5xxx)
    Schedule,
    /// Location errors (6xxx)
    Location,
    /// Subscription / payment errors (7xxx)
    Subscription,
    /// File upload errors (8xxx)
    File,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Employee,
            4000..5000 => Self::Leave,
            5000..6000 => Self::Schedule,
            6000..7000 => Self::Location,
            7000..8000 => Self::Subscription,
            8000..9000 => Self::File,
            _ => Self::System,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Employee => "employee",
            Self::Leave => "leave",
            Self::Schedule => "schedule",
            Self::Location => "location",
            Self::Subscription => "subscription",
            Self::File => "file",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2003), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Employee);
        assert_eq!(ErrorCategory::from_code(4002), ErrorCategory::Leave);
        assert_eq!(ErrorCategory::from_code(5101), ErrorCategory::Schedule);
        assert_eq!(ErrorCategory::from_code(6003), ErrorCategory::Location);
        assert_eq!(ErrorCategory::from_code(7004), ErrorCategory::Subscription);
        assert_eq!(ErrorCategory::from_code(8001), ErrorCategory::File);
        assert_eq!(ErrorCategory::from_code(9204), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::LeaveRequestNotPending.category(),
            ErrorCategory::Leave
        );
        assert_eq!(
            ErrorCode::StorageFailed.category(),
            ErrorCategory::System
        );
        assert_eq!(ErrorCode::LocationInUse.category().name(), "location");
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::Schedule).unwrap();
        assert_eq!(json, "\"schedule\"");
        let category: ErrorCategory = serde_json::from_str("\"auth\"").unwrap();
        assert_eq!(category, ErrorCategory::Auth);
    }
}
