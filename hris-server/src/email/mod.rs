//! Transactional email via AWS SES v2
//!
//! Bodies are plain HTML strings built here; there is no template engine.

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("email send failed: {0}")]
pub struct EmailError(pub String);

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError>;
}

pub struct SesEmailSender {
    ses: SesClient,
    from: String,
}

impl SesEmailSender {
    pub fn new(ses: SesClient, from: &str) -> Self {
        Self {
            ses,
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        let subject = Content::builder()
            .data(subject)
            .build()
            .map_err(|e| EmailError(e.to_string()))?;
        let html = Content::builder()
            .data(html_body)
            .build()
            .map_err(|e| EmailError(e.to_string()))?;

        let body = Body::builder().html(html).build();
        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| EmailError(e.to_string()))?;

        tracing::info!(to = to, "Email sent");
        Ok(())
    }
}

/// A rendered message
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn welcome(name: &str, company: &str) -> EmailMessage {
    let (name, company) = (escape_html(name), escape_html(company));
    EmailMessage {
        subject: "Welcome to HRIS".to_string(),
        html: format!(
            "<p>Hi {name},</p>\
             <p>Your HRIS workspace for <strong>{company}</strong> is ready. \
             Your free trial has started.</p>"
        ),
    }
}

pub fn payment_succeeded(plan: &str, period_end: &str) -> EmailMessage {
    EmailMessage {
        subject: "Payment received".to_string(),
        html: format!(
            "<p>Your payment for the <strong>{plan}</strong> plan was received.</p>\
             <p>Your subscription is active until {period_end}.</p>"
        ),
    }
}

pub fn payment_failed(plan: &str, reason: &str) -> EmailMessage {
    let reason = escape_html(reason);
    EmailMessage {
        subject: "Payment failed".to_string(),
        html: format!(
            "<p>Your payment for the <strong>{plan}</strong> plan could not be processed.</p>\
             <p>Reason: {reason}</p><p>Please start a new checkout to try again.</p>"
        ),
    }
}
