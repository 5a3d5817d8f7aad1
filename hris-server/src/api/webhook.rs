//! Payment callback handler
//!
//! POST /v1/webhooks/xendit: raw body, verified before decoding

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use shared::ApiResponse;
use shared::error::{AppError, ErrorCode};

use crate::payment::{WebhookEvent, verify_callback_signature};
use crate::services::WebhookOutcome;
use crate::state::AppState;

use super::ApiResult;

pub const SIGNATURE_HEADER: &str = "x-callback-signature";

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<()> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(e) = verify_callback_signature(&body, signature, &state.callback_token) {
        tracing::warn!(error = e, "Callback signature verification failed");
        return Err(AppError::new(ErrorCode::WebhookSignatureInvalid));
    }

    let event = WebhookEvent::decode(&body).map_err(|e| {
        tracing::warn!(%e, "Failed to decode callback payload");
        AppError::with_message(ErrorCode::WebhookPayloadInvalid, e.to_string())
    })?;
    tracing::info!(
        webhook_type = event.webhook_type(),
        invoice_id = event.invoice_id(),
        external_id = event.external_id(),
        "Received payment callback"
    );

    let outcome = state.subscriptions.handle_webhook(&event).await?;
    let message = match outcome {
        WebhookOutcome::Processed => "processed",
        WebhookOutcome::Duplicate => "duplicate",
        WebhookOutcome::Ignored => "ignored",
    };
    Ok(ApiResponse::message(message))
}
