//! Subscriptions, checkout and payment callbacks
//!
//! A user holds at most one open (trial / pending / active) subscription.
//! Checkout replaces an open trial with a pending subscription and opens an
//! invoice at the configured gateway; callbacks and status syncs move it on.

use std::sync::Arc;

use chrono::DateTime;
use shared::date::format_date;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CheckoutRequest, CheckoutResponse, Subscription, SubscriptionPlan, SubscriptionStatus,
};
use shared::util::{DAY_MS, now_millis};

use crate::auth::CurrentUser;
use crate::db::{NewSubscription, SubscriptionRepo, UserRepo};
use crate::email::{self, EmailMessage, EmailSender};
use crate::error::ServiceResult;
use crate::payment::{InvoiceRequest, InvoiceStatus, PaymentGateway, WebhookEvent};

/// Plan started at registration; never sold through checkout
pub const TRIAL_PLAN: &str = "trial";

/// Free trial row for a new account
pub fn trial_subscription(user_id: &str, plan: &SubscriptionPlan, now: i64) -> NewSubscription {
    NewSubscription {
        user_id: user_id.to_string(),
        plan_id: plan.id,
        seats: plan.max_employees,
        amount: 0,
        status: SubscriptionStatus::Trial,
        trial_ends_at: Some(now + i64::from(plan.period_days) * DAY_MS),
        external_id: None,
    }
}

/// What a webhook delivery did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    /// Same `(invoice_id, webhook_type)` seen before
    Duplicate,
    /// Unknown order or a subscription no longer awaiting payment
    Ignored,
}

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::SubscriptionNotFound).with_detail("subscription_id", id)
}

fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| format_date(dt.date_naive()))
        .unwrap_or_default()
}

pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepo>,
    users: Arc<dyn UserRepo>,
    gateway: Arc<dyn PaymentGateway>,
    email: Arc<dyn EmailSender>,
    success_url: String,
    failure_url: String,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepo>,
        users: Arc<dyn UserRepo>,
        gateway: Arc<dyn PaymentGateway>,
        email: Arc<dyn EmailSender>,
        success_url: &str,
        failure_url: &str,
    ) -> Self {
        Self {
            subscriptions,
            users,
            gateway,
            email,
            success_url: success_url.to_string(),
            failure_url: failure_url.to_string(),
        }
    }

    pub async fn plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        self.subscriptions.list_plans().await
    }

    pub async fn my_subscription(&self, user_id: &str) -> ServiceResult<Subscription> {
        self.subscriptions
            .find_latest_subscription(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound).into())
    }

    pub async fn checkout(
        &self,
        user_id: &str,
        req: CheckoutRequest,
    ) -> ServiceResult<CheckoutResponse> {
        let plan = self
            .subscriptions
            .find_plan_by_code(req.plan_code.trim())
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::PlanNotFound).with_detail("plan_code", req.plan_code.clone())
            })?;
        if plan.code == TRIAL_PLAN {
            return Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                "The trial plan cannot be purchased",
            )
            .into());
        }
        if req.seats < 1 || req.seats > plan.max_employees {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("seats must be between 1 and {}", plan.max_employees),
            )
            .with_detail("seats", req.seats)
            .into());
        }

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

        let close_trial = match self.subscriptions.find_open_subscription(user_id).await? {
            Some(open) if open.status == SubscriptionStatus::Trial => Some(open.id),
            Some(open) => {
                return Err(AppError::new(ErrorCode::SubscriptionExists)
                    .with_detail("subscription_id", open.id)
                    .with_detail("status", open.status.as_db())
                    .into());
            }
            None => None,
        };

        let external_id = format!("sub-{}", uuid::Uuid::new_v4().simple());
        let amount = plan.price_per_seat * i64::from(req.seats);
        let new = NewSubscription {
            user_id: user.id.clone(),
            plan_id: plan.id,
            seats: req.seats,
            amount,
            status: SubscriptionStatus::Pending,
            trial_ends_at: None,
            external_id: Some(external_id.clone()),
        };
        let subscription = self.subscriptions.create_subscription(&new, close_trial).await?;

        let request = InvoiceRequest {
            external_id: external_id.clone(),
            amount,
            description: format!("{} plan, {} seats", plan.name, req.seats),
            payer_email: user.email.clone(),
            success_url: self.success_url.clone(),
            failure_url: self.failure_url.clone(),
        };
        let session = match self.gateway.create_checkout(&request).await {
            Ok(session) => session,
            Err(e) => {
                self.subscriptions
                    .set_subscription_status(
                        subscription.id,
                        SubscriptionStatus::Failed,
                        Some(&e.to_string()),
                    )
                    .await?;
                return Err(e.into());
            }
        };
        self.subscriptions
            .attach_checkout(
                subscription.id,
                &session.invoice_id,
                &session.checkout_url,
                self.gateway.name(),
            )
            .await?;

        tracing::info!(
            subscription_id = subscription.id,
            user_id = %user.id,
            plan = %plan.code,
            seats = req.seats,
            amount,
            gateway = self.gateway.name(),
            "Checkout created"
        );
        Ok(CheckoutResponse {
            subscription_id: subscription.id,
            external_id,
            checkout_url: session.checkout_url,
            amount,
        })
    }

    /// Ask the gateway about a pending invoice and apply what it reports
    pub async fn sync_status(&self, user: &CurrentUser, id: i64) -> ServiceResult<Subscription> {
        let subscription = self.find(id).await?;
        if subscription.user_id != user.id && !user.is_admin() {
            return Err(AppError::forbidden("Not your subscription").into());
        }
        if subscription.status != SubscriptionStatus::Pending {
            return Ok(subscription);
        }
        let (Some(external_id), Some(invoice_id)) =
            (&subscription.external_id, &subscription.invoice_id)
        else {
            return Ok(subscription);
        };

        let status = self.gateway.get_status(external_id, invoice_id).await?;
        tracing::info!(subscription_id = id, status = ?status, "Gateway status fetched");
        match status {
            InvoiceStatus::Pending => return Ok(subscription),
            InvoiceStatus::Paid { paid_at } => self.activate(&subscription, paid_at).await?,
            InvoiceStatus::Expired => self.expire(&subscription).await?,
            InvoiceStatus::Failed { reason } => self.fail(&subscription, &reason).await?,
        }
        self.find(id).await
    }

    /// Apply a verified, decoded payment callback
    pub async fn handle_webhook(&self, event: &WebhookEvent) -> ServiceResult<WebhookOutcome> {
        let (invoice_id, webhook_type) = (event.invoice_id(), event.webhook_type());
        if !self
            .subscriptions
            .record_webhook_event(invoice_id, webhook_type)
            .await?
        {
            tracing::info!(invoice_id, webhook_type, "Duplicate webhook event, skipping");
            return Ok(WebhookOutcome::Duplicate);
        }

        let result = self.apply_webhook(event).await;
        if result.is_err() {
            // Release the delivery so the gateway's retry is applied
            if let Err(e) = self
                .subscriptions
                .forget_webhook_event(invoice_id, webhook_type)
                .await
            {
                tracing::warn!(invoice_id, webhook_type, error = %e, "Failed to release webhook event");
            }
        }
        result
    }

    async fn apply_webhook(&self, event: &WebhookEvent) -> ServiceResult<WebhookOutcome> {
        let webhook_type = event.webhook_type();
        let Some(subscription) = self
            .subscriptions
            .find_subscription_by_external_id(event.external_id())
            .await?
        else {
            tracing::warn!(
                external_id = event.external_id(),
                webhook_type,
                "Webhook for unknown order"
            );
            return Ok(WebhookOutcome::Ignored);
        };
        if subscription.status != SubscriptionStatus::Pending {
            tracing::warn!(
                subscription_id = subscription.id,
                status = subscription.status.as_db(),
                webhook_type,
                "Webhook for a subscription not awaiting payment"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        match event {
            WebhookEvent::Paid {
                paid_at,
                payment_method,
                ..
            } => {
                tracing::info!(subscription_id = subscription.id, payment_method = %payment_method, "Payment received");
                self.activate(&subscription, paid_at.timestamp_millis())
                    .await?;
            }
            WebhookEvent::Expired { .. } => self.expire(&subscription).await?,
            WebhookEvent::Failed { failure_reason, .. } => {
                self.fail(&subscription, failure_reason).await?
            }
        }
        Ok(WebhookOutcome::Processed)
    }

    async fn find(&self, id: i64) -> ServiceResult<Subscription> {
        self.subscriptions
            .find_subscription(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    async fn activate(&self, subscription: &Subscription, paid_at: i64) -> ServiceResult<()> {
        let plan = self
            .subscriptions
            .find_plan_by_code(&subscription.plan_code)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound))?;
        let period_end = paid_at + i64::from(plan.period_days) * DAY_MS;
        self.subscriptions
            .mark_paid(subscription.id, period_end)
            .await?;
        tracing::info!(
            subscription_id = subscription.id,
            period_end,
            "Subscription activated"
        );
        self.notify(
            &subscription.user_id,
            email::payment_succeeded(&plan.name, &format_millis(period_end)),
        )
        .await;
        Ok(())
    }

    async fn expire(&self, subscription: &Subscription) -> ServiceResult<()> {
        self.subscriptions
            .set_subscription_status(subscription.id, SubscriptionStatus::Expired, None)
            .await?;
        tracing::info!(subscription_id = subscription.id, "Subscription invoice expired");
        Ok(())
    }

    async fn fail(&self, subscription: &Subscription, reason: &str) -> ServiceResult<()> {
        self.subscriptions
            .set_subscription_status(subscription.id, SubscriptionStatus::Failed, Some(reason))
            .await?;
        tracing::info!(subscription_id = subscription.id, reason, "Subscription payment failed");
        self.notify(
            &subscription.user_id,
            email::payment_failed(&subscription.plan_code, reason),
        )
        .await;
        Ok(())
    }

    /// Best effort: delivery problems are logged, never returned
    async fn notify(&self, user_id: &str, message: EmailMessage) {
        let user = match self.users.find_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(user_id, "No user to notify");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load user for notification");
                return;
            }
        };
        if let Err(e) = self
            .email
            .send(&user.email, &message.subject, &message.html)
            .await
        {
            tracing::warn!(user_id, error = %e, "Failed to send subscription email");
        }
    }
}
