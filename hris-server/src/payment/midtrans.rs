//! Midtrans Snap checkout and transaction status

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CheckoutSession, InvoiceRequest, InvoiceStatus, PaymentError, PaymentGateway};

pub struct MidtransGateway {
    http: reqwest::Client,
    server_key: String,
    snap_base: &'static str,
    api_base: &'static str,
}

impl MidtransGateway {
    pub fn new(server_key: &str, production: bool) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let (snap_base, api_base) = if production {
            ("https://app.midtrans.com", "https://api.midtrans.com")
        } else {
            (
                "https://app.sandbox.midtrans.com",
                "https://api.sandbox.midtrans.com",
            )
        };
        Ok(Self {
            http,
            server_key: server_key.to_string(),
            snap_base,
            api_base,
        })
    }
}

#[derive(Deserialize)]
struct SnapResponse {
    token: String,
    redirect_url: String,
}

#[derive(Deserialize)]
struct TransactionStatus {
    transaction_status: Option<String>,
    #[serde(default)]
    fraud_status: Option<String>,
    #[serde(default)]
    settlement_time: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

/// Midtrans reports times as `YYYY-MM-DD HH:MM:SS` in WIB (UTC+7)
fn parse_midtrans_time(s: &str) -> Option<i64> {
    let naive = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    let wib = chrono::FixedOffset::east_opt(7 * 3600)?;
    naive
        .and_local_timezone(wib)
        .single()
        .map(|t| t.timestamp_millis())
}

fn map_status(tx: &TransactionStatus) -> InvoiceStatus {
    match tx.transaction_status.as_deref() {
        Some("settlement") => InvoiceStatus::Paid {
            paid_at: tx
                .settlement_time
                .as_deref()
                .and_then(parse_midtrans_time)
                .unwrap_or_else(shared::util::now_millis),
        },
        Some("capture") if tx.fraud_status.as_deref() != Some("deny") => InvoiceStatus::Paid {
            paid_at: shared::util::now_millis(),
        },
        Some("pending") | None => InvoiceStatus::Pending,
        Some("expire") => InvoiceStatus::Expired,
        Some(other) => InvoiceStatus::Failed {
            reason: tx
                .status_message
                .clone()
                .unwrap_or_else(|| format!("transaction status {other}")),
        },
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    fn name(&self) -> &'static str {
        "midtrans"
    }

    async fn create_checkout(
        &self,
        request: &InvoiceRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let resp = self
            .http
            .post(format!("{}/snap/v1/transactions", self.snap_base))
            .basic_auth(&self.server_key, Some(""))
            .json(&serde_json::json!({
                "transaction_details": {
                    "order_id": request.external_id,
                    "gross_amount": request.amount,
                },
                "customer_details": { "email": request.payer_email },
                "item_details": [{
                    "id": request.external_id,
                    "name": request.description,
                    "price": request.amount,
                    "quantity": 1,
                }],
                "callbacks": { "finish": request.success_url },
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!(
                "Midtrans create transaction failed ({status}): {text}"
            )));
        }

        let snap: SnapResponse = resp.json().await?;
        tracing::info!(order_id = %request.external_id, "Midtrans Snap transaction created");

        Ok(CheckoutSession {
            invoice_id: snap.token,
            checkout_url: snap.redirect_url,
        })
    }

    async fn get_status(
        &self,
        external_id: &str,
        _invoice_id: &str,
    ) -> Result<InvoiceStatus, PaymentError> {
        let resp = self
            .http
            .get(format!("{}/v2/{external_id}/status", self.api_base))
            .basic_auth(&self.server_key, Some(""))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!(
                "Midtrans status failed ({status}): {text}"
            )));
        }

        let tx: TransactionStatus = resp.json().await?;
        Ok(map_status(&tx))
    }
}
