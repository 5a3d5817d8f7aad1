//! Payment gateway integration via REST API (no SDK dependency)
//!
//! - [`PaymentGateway`]: create checkout invoices and query their status
//! - [`WebhookEvent`]: decoded payment callback
//! - [`verify_callback_signature`]: HMAC-SHA256 check of the raw callback body

pub mod midtrans;
pub mod xendit;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

pub use midtrans::MidtransGateway;
pub use xendit::XenditGateway;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Invoice to open at the gateway
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    /// Our order reference, echoed back in callbacks
    pub external_id: String,
    /// Amount in IDR
    pub amount: i64,
    pub description: String,
    pub payer_email: String,
    pub success_url: String,
    pub failure_url: String,
}

/// Hosted checkout created by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Gateway-side invoice / transaction reference
    pub invoice_id: String,
    pub checkout_url: String,
}

/// Invoice state as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceStatus {
    Pending,
    Paid { paid_at: i64 },
    Expired,
    Failed { reason: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short name stored on the subscription (`xendit`, `midtrans`)
    fn name(&self) -> &'static str;

    async fn create_checkout(&self, request: &InvoiceRequest)
    -> Result<CheckoutSession, PaymentError>;

    async fn get_status(
        &self,
        external_id: &str,
        invoice_id: &str,
    ) -> Result<InvoiceStatus, PaymentError>;
}

/// Payment callback, keyed by `webhook_type`
///
/// Every variant's fields are required at decode time; an unknown type or a
/// missing field fails deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "webhook_type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Paid {
        external_id: String,
        invoice_id: String,
        paid_at: DateTime<Utc>,
        payment_method: String,
    },
    Expired {
        external_id: String,
        invoice_id: String,
    },
    Failed {
        external_id: String,
        invoice_id: String,
        failure_reason: String,
    },
}

impl WebhookEvent {
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn webhook_type(&self) -> &'static str {
        match self {
            WebhookEvent::Paid { .. } => "paid",
            WebhookEvent::Expired { .. } => "expired",
            WebhookEvent::Failed { .. } => "failed",
        }
    }

    pub fn external_id(&self) -> &str {
        match self {
            WebhookEvent::Paid { external_id, .. }
            | WebhookEvent::Expired { external_id, .. }
            | WebhookEvent::Failed { external_id, .. } => external_id,
        }
    }

    pub fn invoice_id(&self) -> &str {
        match self {
            WebhookEvent::Paid { invoice_id, .. }
            | WebhookEvent::Expired { invoice_id, .. }
            | WebhookEvent::Failed { invoice_id, .. } => invoice_id,
        }
    }
}

/// Verify the hex HMAC-SHA256 signature of a callback body
pub fn verify_callback_signature(
    payload: &[u8],
    signature_hex: &str,
    key: &str,
) -> Result<(), &'static str> {
    if signature_hex.trim().is_empty() {
        return Err("Missing callback signature");
    }
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(payload);

    // Constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature_hex.trim()).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Callback signature mismatch")
}

#[cfg(test)]
pub(crate) fn sign_callback(payload: &[u8], key: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_accepts_valid() {
        let body = br#"{"webhook_type":"expired"}"#;
        let sig = sign_callback(body, "cb-key");
        assert!(verify_callback_signature(body, &sig, "cb-key").is_ok());
    }

    #[test]
    fn test_signature_rejects_tampered_or_wrong_key() {
        let body = br#"{"webhook_type":"expired"}"#;
        let sig = sign_callback(body, "cb-key");
        assert!(verify_callback_signature(b"{}", &sig, "cb-key").is_err());
        assert!(verify_callback_signature(body, &sig, "other-key").is_err());
        assert!(verify_callback_signature(body, "zz-not-hex", "cb-key").is_err());
        assert!(verify_callback_signature(body, "", "cb-key").is_err());
    }

    #[test]
    fn test_decode_paid() {
        let body = br#"{
            "webhook_type": "paid",
            "external_id": "sub-1-abc",
            "invoice_id": "inv_123",
            "paid_at": "2024-05-01T10:00:00Z",
            "payment_method": "BANK_TRANSFER"
        }"#;
        let event = WebhookEvent::decode(body).unwrap();
        assert_eq!(event.webhook_type(), "paid");
        assert_eq!(event.external_id(), "sub-1-abc");
        assert_eq!(event.invoice_id(), "inv_123");
    }

    #[test]
    fn test_decode_failed_requires_reason() {
        let body = br#"{"webhook_type":"failed","external_id":"e","invoice_id":"i"}"#;
        assert!(WebhookEvent::decode(body).is_err());

        let body = br#"{"webhook_type":"failed","external_id":"e","invoice_id":"i","failure_reason":"declined"}"#;
        let event = WebhookEvent::decode(body).unwrap();
        assert_eq!(
            event,
            WebhookEvent::Failed {
                external_id: "e".into(),
                invoice_id: "i".into(),
                failure_reason: "declined".into(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_type_and_missing_fields() {
        let body = br#"{"webhook_type":"refunded","external_id":"e","invoice_id":"i"}"#;
        assert!(WebhookEvent::decode(body).is_err());

        let body = br#"{"webhook_type":"paid","external_id":"e","invoice_id":"i"}"#;
        assert!(WebhookEvent::decode(body).is_err());
    }
}
