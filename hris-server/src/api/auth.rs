//! Authentication endpoints under `/v1/auth`

use axum::{Extension, Json, extract::State};
use shared::ApiResponse;
use shared::models::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, GoogleLoginRequest, LoginRequest,
    MeResponse, RefreshRequest, RegisterRequest,
};

use crate::auth::CurrentUser;
use crate::state::AppState;

use super::ApiResult;

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let resp = state.auth.register(req).await?;
    Ok(ApiResponse::success_with_message("Registration successful", resp))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    Ok(ApiResponse::success(state.auth.login(req).await?))
}

/// POST /v1/auth/google
pub async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<AuthResponse> {
    Ok(ApiResponse::success(
        state.auth.login_with_google(&req.id_token).await?,
    ))
}

/// POST /v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<AuthResponse> {
    Ok(ApiResponse::success(
        state.auth.refresh(&req.refresh_token).await?,
    ))
}

/// POST /v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<()> {
    state.auth.logout(&req.refresh_token).await?;
    Ok(ApiResponse::message("Logged out"))
}

/// POST /v1/auth/password/forgot
///
/// Same answer whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<()> {
    state.auth.forgot_password(&req.email).await;
    Ok(ApiResponse::message(
        "If an account exists for this email, a password reset link has been sent",
    ))
}

/// POST /v1/auth/password/change
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    state.auth.change_password(&user.id, req).await?;
    Ok(ApiResponse::message("Password changed"))
}

/// GET /v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<MeResponse> {
    Ok(ApiResponse::success(state.auth.me(&user.id).await?))
}
