//! Xendit invoices (`/v2/invoices`)

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CheckoutSession, InvoiceRequest, InvoiceStatus, PaymentError, PaymentGateway};

const XENDIT_API_BASE: &str = "https://api.xendit.co";

pub struct XenditGateway {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl XenditGateway {
    pub fn new(secret_key: &str) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            secret_key: secret_key.to_string(),
            base_url: XENDIT_API_BASE.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct XenditInvoice {
    id: String,
    #[serde(default)]
    invoice_url: Option<String>,
    status: String,
    #[serde(default)]
    paid_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Map Xendit's invoice status onto ours
fn map_status(invoice: &XenditInvoice) -> InvoiceStatus {
    match invoice.status.as_str() {
        "PAID" | "SETTLED" => InvoiceStatus::Paid {
            paid_at: invoice
                .paid_at
                .map(|t| t.timestamp_millis())
                .unwrap_or_else(shared::util::now_millis),
        },
        "EXPIRED" => InvoiceStatus::Expired,
        "PENDING" => InvoiceStatus::Pending,
        other => InvoiceStatus::Failed {
            reason: format!("invoice status {other}"),
        },
    }
}

#[async_trait]
impl PaymentGateway for XenditGateway {
    fn name(&self) -> &'static str {
        "xendit"
    }

    async fn create_checkout(
        &self,
        request: &InvoiceRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let resp = self
            .http
            .post(format!("{}/v2/invoices", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&serde_json::json!({
                "external_id": request.external_id,
                "amount": request.amount,
                "currency": "IDR",
                "description": request.description,
                "payer_email": request.payer_email,
                "success_redirect_url": request.success_url,
                "failure_redirect_url": request.failure_url,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!(
                "Xendit create invoice failed ({status}): {text}"
            )));
        }

        let invoice: XenditInvoice = resp.json().await?;
        let checkout_url = invoice
            .invoice_url
            .ok_or_else(|| PaymentError::Gateway("Xendit invoice has no invoice_url".into()))?;

        tracing::info!(
            external_id = %request.external_id,
            invoice_id = %invoice.id,
            "Xendit invoice created"
        );

        Ok(CheckoutSession {
            invoice_id: invoice.id,
            checkout_url,
        })
    }

    async fn get_status(
        &self,
        _external_id: &str,
        invoice_id: &str,
    ) -> Result<InvoiceStatus, PaymentError> {
        let resp = self
            .http
            .get(format!("{}/v2/invoices/{invoice_id}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!(
                "Xendit get invoice failed ({status}): {text}"
            )));
        }

        let invoice: XenditInvoice = resp.json().await?;
        Ok(map_status(&invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(json: serde_json::Value) -> XenditInvoice {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_map_status() {
        let paid = invoice(serde_json::json!({
            "id": "inv_1", "status": "PAID", "paid_at": "2024-05-01T10:00:00Z"
        }));
        assert_eq!(
            map_status(&paid),
            InvoiceStatus::Paid {
                paid_at: 1_714_557_600_000
            }
        );

        let expired = invoice(serde_json::json!({ "id": "inv_2", "status": "EXPIRED" }));
        assert_eq!(map_status(&expired), InvoiceStatus::Expired);

        let pending = invoice(serde_json::json!({ "id": "inv_3", "status": "PENDING" }));
        assert_eq!(map_status(&pending), InvoiceStatus::Pending);
    }
}
