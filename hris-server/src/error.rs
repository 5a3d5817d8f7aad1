//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer and integration errors and the API-layer
//! error (`AppError`). It enables `?` propagation without manual
//! `.map_err(|e| { tracing::error!(...); AppError::new(...) })` boilerplate.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::email::EmailError;
use crate::identity::IdentityError;
use crate::payment::PaymentError;
use crate::storage::StorageError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error (sqlx, serde, etc.)
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl ServiceError {
    /// Business error code, if any
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ServiceError::App(e) => Some(e.code),
            ServiceError::Db(_) => None,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Db(e) => write!(f, "{e}"),
            ServiceError::App(e) => write!(f, "{}: {}", e.code, e.message),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        tracing::error!(error = %e, "Object storage error");
        ServiceError::App(AppError::new(ErrorCode::StorageFailed))
    }
}

impl From<EmailError> for ServiceError {
    fn from(e: EmailError) -> Self {
        tracing::error!(error = %e, "Email provider error");
        ServiceError::App(AppError::new(ErrorCode::EmailFailed))
    }
}

impl From<PaymentError> for ServiceError {
    fn from(e: PaymentError) -> Self {
        tracing::error!(error = %e, "Payment gateway error");
        ServiceError::App(AppError::new(ErrorCode::PaymentGatewayError))
    }
}

impl From<IdentityError> for ServiceError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidCredentials => {
                ServiceError::App(AppError::invalid_credentials())
            }
            IdentityError::AlreadyExists => ServiceError::App(AppError::with_message(
                ErrorCode::AlreadyExists,
                "An account with this email already exists",
            )),
            other => {
                tracing::error!(error = %other, "Identity provider error");
                ServiceError::App(AppError::new(ErrorCode::IdentityProviderError))
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
