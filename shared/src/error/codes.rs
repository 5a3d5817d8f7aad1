//! Unified error codes for the HRIS backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Employee errors
//! - 4xxx: Leave request errors
//! - 5xxx: Work schedule / check-clock errors
//! - 6xxx: Location errors
//! - 7xxx: Subscription / payment errors
//! - 8xxx: File upload errors
//! - 9xxx: System and integration errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as its `u16` value so clients can switch on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests
    RateLimited = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (identifier/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Password too short
    PasswordTooShort = 1008,
    /// User not found
    UserNotFound = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 3001,
    /// Employee code already in use
    EmployeeCodeExists = 3002,
    /// Position not found
    PositionNotFound = 3003,
    /// Employee is inactive
    EmployeeInactive = 3004,

    // ==================== 4xxx: Leave ====================
    /// Leave request not found
    LeaveRequestNotFound = 4001,
    /// Leave request is no longer pending
    LeaveRequestNotPending = 4002,
    /// Start date after end date
    InvalidDateRange = 4003,
    /// Target status not allowed
    InvalidLeaveStatus = 4004,

    // ==================== 5xxx: Schedule ====================
    /// Work schedule not found
    WorkScheduleNotFound = 5001,
    /// Work schedule detail is invalid
    WorkScheduleDetailInvalid = 5002,
    /// Check-clock setting not found
    CheckclockSettingNotFound = 5101,
    /// Employee already has a check-clock setting
    CheckclockSettingExists = 5102,

    // ==================== 6xxx: Location ====================
    /// Location not found
    LocationNotFound = 6001,
    /// Location is required for work-from-office details
    LocationRequired = 6002,
    /// Location is referenced by a schedule detail
    LocationInUse = 6003,

    // ==================== 7xxx: Subscription ====================
    /// Plan not found
    PlanNotFound = 7001,
    /// Subscription not found
    SubscriptionNotFound = 7002,
    /// An open subscription already exists
    SubscriptionExists = 7003,
    /// Webhook signature missing or invalid
    WebhookSignatureInvalid = 7004,
    /// Webhook payload invalid
    WebhookPayloadInvalid = 7005,

    // ==================== 8xxx: File upload ====================
    /// File too large
    FileTooLarge = 8001,
    /// Unsupported file format
    UnsupportedFileFormat = 8002,
    /// No file provided in request
    NoFileProvided = 8003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Object storage failure
    StorageFailed = 9201,
    /// Email provider failure
    EmailFailed = 9202,
    /// Payment gateway failure
    PaymentGatewayError = 9203,
    /// Identity provider failure
    IdentityProviderError = 9204,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::RateLimited => "Too many requests, try again later",

            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::UserNotFound => "User not found",

            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin role required",

            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::EmployeeCodeExists => "Employee code already exists",
            ErrorCode::PositionNotFound => "Position not found",
            ErrorCode::EmployeeInactive => "Employee is inactive",

            ErrorCode::LeaveRequestNotFound => "Leave request not found",
            ErrorCode::LeaveRequestNotPending => "Leave request is no longer pending",
            ErrorCode::InvalidDateRange => "start date must be before or equal to end date",
            ErrorCode::InvalidLeaveStatus => "status must be Approved or Rejected",

            ErrorCode::WorkScheduleNotFound => "Work schedule not found",
            ErrorCode::WorkScheduleDetailInvalid => "Work schedule detail is invalid",
            ErrorCode::CheckclockSettingNotFound => "Check-clock setting not found",
            ErrorCode::CheckclockSettingExists => "Employee already has a check-clock setting",

            ErrorCode::LocationNotFound => "Location not found",
            ErrorCode::LocationRequired => "Location is required for WFO work type",
            ErrorCode::LocationInUse => "Location is used by a work schedule",

            ErrorCode::PlanNotFound => "Subscription plan not found",
            ErrorCode::SubscriptionNotFound => "Subscription not found",
            ErrorCode::SubscriptionExists => "An open subscription already exists",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature is invalid",
            ErrorCode::WebhookPayloadInvalid => "Webhook payload is invalid",

            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::NoFileProvided => "No file provided",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageFailed => "File storage failed",
            ErrorCode::EmailFailed => "Email delivery failed",
            ErrorCode::PaymentGatewayError => "Payment gateway error",
            ErrorCode::IdentityProviderError => "Identity provider error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            6 => ErrorCode::InvalidFormat,
            7 => ErrorCode::RequiredField,
            8 => ErrorCode::ValueOutOfRange,
            9 => ErrorCode::RateLimited,

            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            1007 => ErrorCode::AccountDisabled,
            1008 => ErrorCode::PasswordTooShort,
            1009 => ErrorCode::UserNotFound,

            2001 => ErrorCode::PermissionDenied,
            2003 => ErrorCode::AdminRequired,

            3001 => ErrorCode::EmployeeNotFound,
            3002 => ErrorCode::EmployeeCodeExists,
            3003 => ErrorCode::PositionNotFound,
            3004 => ErrorCode::EmployeeInactive,

            4001 => ErrorCode::LeaveRequestNotFound,
            4002 => ErrorCode::LeaveRequestNotPending,
            4003 => ErrorCode::InvalidDateRange,
            4004 => ErrorCode::InvalidLeaveStatus,

            5001 => ErrorCode::WorkScheduleNotFound,
            5002 => ErrorCode::WorkScheduleDetailInvalid,
            5101 => ErrorCode::CheckclockSettingNotFound,
            5102 => ErrorCode::CheckclockSettingExists,

            6001 => ErrorCode::LocationNotFound,
            6002 => ErrorCode::LocationRequired,
            6003 => ErrorCode::LocationInUse,

            7001 => ErrorCode::PlanNotFound,
            7002 => ErrorCode::SubscriptionNotFound,
            7003 => ErrorCode::SubscriptionExists,
            7004 => ErrorCode::WebhookSignatureInvalid,
            7005 => ErrorCode::WebhookPayloadInvalid,

            8001 => ErrorCode::FileTooLarge,
            8002 => ErrorCode::UnsupportedFileFormat,
            8003 => ErrorCode::NoFileProvided,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9003 => ErrorCode::ConfigError,
            9201 => ErrorCode::StorageFailed,
            9202 => ErrorCode::EmailFailed,
            9203 => ErrorCode::PaymentGatewayError,
            9204 => ErrorCode::IdentityProviderError,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
