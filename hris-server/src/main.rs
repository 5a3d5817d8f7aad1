//! hris-server: HR information system backend
//!
//! Long-running service that:
//! - Authenticates company admins and employees (identity provider + JWT)
//! - Manages employees, positions, locations, work schedules and check-clock settings
//! - Runs the leave request workflow and materializes leave attendance
//! - Sells subscriptions through Xendit or Midtrans and processes payment callbacks

mod api;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod identity;
mod payment;
mod services;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;

use axum::http::HeaderName;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(&config.log_format);

    tracing::info!(
        environment = %config.environment,
        gateway = ?config.payment_gateway,
        "Starting hris-server"
    );

    let state = AppState::new(&config).await?;

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let app = api::create_router(state.clone()).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(CorsLayer::permissive()),
    );

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("hris-server HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line
fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hris_server=info,tower_http=info".into());
    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
