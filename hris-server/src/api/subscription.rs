//! Subscription endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::models::{CheckoutRequest, CheckoutResponse, Subscription, SubscriptionPlan};

use crate::auth::CurrentUser;
use crate::state::AppState;

use super::ApiResult;

/// GET /v1/api/subscription/plans
pub async fn plans(State(state): State<AppState>) -> ApiResult<Vec<SubscriptionPlan>> {
    Ok(ApiResponse::success(state.subscriptions.plans().await?))
}

/// GET /v1/api/subscription/me
pub async fn mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Subscription> {
    Ok(ApiResponse::success(
        state.subscriptions.my_subscription(&user.id).await?,
    ))
}

/// POST /v1/api/subscription/checkout
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    Ok(ApiResponse::success(
        state.subscriptions.checkout(&user.id, req).await?,
    ))
}

/// POST /v1/api/subscription/{id}/sync
pub async fn sync(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Subscription> {
    Ok(ApiResponse::success(
        state.subscriptions.sync_status(&user, id).await?,
    ))
}
