//! Bearer-token authentication for `/v1/api/*`

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};

use super::jwt::{CurrentUser, JwtService, TokenType};
use crate::state::AppState;

/// Middleware that verifies the access token and inserts [`CurrentUser`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Missing Authorization header")
        })?;

    let token = JwtService::extract_from_header(header).ok_or_else(|| {
        AppError::with_message(ErrorCode::NotAuthenticated, "Invalid Authorization format")
    })?;

    let claims = state
        .jwt
        .validate_as(token, TokenType::Access)
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {e}");
            AppError::from(e)
        })?;

    request.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(request).await)
}

/// HR-only routes; must run after [`auth_middleware`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)?;
    user.ensure_admin()?;
    Ok(next.run(request).await)
}
