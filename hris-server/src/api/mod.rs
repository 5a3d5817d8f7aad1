//! HTTP routes for hris-server

pub mod attendance;
pub mod auth;
pub mod checkclock;
pub mod employee;
pub mod health;
pub mod leave_request;
pub mod location;
pub mod subscription;
pub mod webhook;
pub mod work_schedule;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use shared::ApiResponse;
use shared::error::AppError;

use crate::auth::middleware::{auth_middleware, require_admin};
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::services::leave_request::MAX_ATTACHMENT_BYTES;
use crate::state::AppState;

/// Result type returned by every JSON handler
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Multipart bodies carry one attachment plus a few text fields
const BODY_LIMIT: usize = MAX_ATTACHMENT_BYTES + 1024 * 1024;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public auth (rate limited per client IP)
    let login = Router::new()
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/auth/google", post(auth::google_login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));
    let register = Router::new()
        .route("/v1/auth/register", post(auth::register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));
    let public_auth = Router::new()
        .route("/v1/auth/refresh", post(auth::refresh))
        .route("/v1/auth/logout", post(auth::logout))
        .route("/v1/auth/password/forgot", post(auth::forgot_password));

    let account = Router::new()
        .route("/v1/auth/me", get(auth::me))
        .route("/v1/auth/password/change", post(auth::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // HR only
    let admin = Router::new()
        .route("/employees", get(employee::list).post(employee::create))
        .route(
            "/employees/{id}",
            get(employee::get)
                .put(employee::update)
                .delete(employee::deactivate),
        )
        .route(
            "/positions",
            get(employee::list_positions).post(employee::create_position),
        )
        .route("/locations", get(location::list).post(location::create))
        .route(
            "/locations/{id}",
            get(location::get)
                .put(location::update)
                .delete(location::delete),
        )
        .route(
            "/work-schedules",
            get(work_schedule::list).post(work_schedule::create),
        )
        .route(
            "/work-schedules/{id}",
            get(work_schedule::get)
                .put(work_schedule::update)
                .delete(work_schedule::delete),
        )
        .route(
            "/checkclock-settings",
            get(checkclock::list).post(checkclock::create),
        )
        .route(
            "/checkclock-settings/{id}",
            get(checkclock::get)
                .put(checkclock::update)
                .delete(checkclock::delete),
        )
        .route(
            "/leave-requests/employee/{employee_id}",
            get(leave_request::list_for_employee),
        )
        .route(
            "/leave-requests/admin",
            post(leave_request::create_for_employee),
        )
        .route(
            "/leave-requests/{id}/status",
            put(leave_request::update_status),
        )
        .route("/subscription/checkout", post(subscription::checkout))
        .route_layer(middleware::from_fn(require_admin));

    // Any signed-in user; handlers narrow employees to their own records
    let member = Router::new()
        .route(
            "/leave-requests",
            get(leave_request::list).post(leave_request::create),
        )
        .route("/leave-requests/me", get(leave_request::list_mine))
        .route(
            "/leave-requests/{id}",
            get(leave_request::get)
                .put(leave_request::update)
                .delete(leave_request::delete),
        )
        .route("/attendances", get(attendance::list))
        .route("/subscription/plans", get(subscription::plans))
        .route("/subscription/me", get(subscription::mine))
        .route("/subscription/{id}/sync", post(subscription::sync));

    let api = admin
        .merge(member)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/webhooks/xendit", post(webhook::handle_webhook))
        .merge(login)
        .merge(register)
        .merge(public_auth)
        .merge(account)
        .nest("/v1/api", api)
        .with_state(state)
}
