//! Plans, subscriptions and webhook idempotency

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Subscription, SubscriptionPlan, SubscriptionStatus};
use shared::util::now_millis;

use super::{PgRepository, SubscriptionRepo};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: String,
    pub plan_id: i64,
    pub seats: i32,
    pub amount: i64,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<i64>,
    pub external_id: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: i64,
    code: String,
    name: String,
    price_per_seat: i64,
    max_employees: i32,
    period_days: i32,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(r: PlanRow) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
            price_per_seat: r.price_per_seat,
            max_employees: r.max_employees,
            period_days: r.period_days,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: String,
    plan_id: i64,
    plan_code: String,
    seats: i32,
    amount: i64,
    status: String,
    trial_ends_at: Option<i64>,
    current_period_end: Option<i64>,
    external_id: Option<String>,
    invoice_id: Option<String>,
    checkout_url: Option<String>,
    gateway: Option<String>,
    failure_reason: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<SubscriptionRow> for Subscription {
    fn from(r: SubscriptionRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            plan_id: r.plan_id,
            plan_code: r.plan_code,
            seats: r.seats,
            amount: r.amount,
            status: SubscriptionStatus::from_db(&r.status).unwrap_or(SubscriptionStatus::Expired),
            trial_ends_at: r.trial_ends_at,
            current_period_end: r.current_period_end,
            external_id: r.external_id,
            invoice_id: r.invoice_id,
            checkout_url: r.checkout_url,
            gateway: r.gateway,
            failure_reason: r.failure_reason,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PLAN_COLUMNS: &str = "id, code, name, price_per_seat, max_employees, period_days";

const SUBSCRIPTION_SELECT: &str = "SELECT s.id, s.user_id, s.plan_id, p.code AS plan_code,
        s.seats, s.amount, s.status, s.trial_ends_at, s.current_period_end, s.external_id,
        s.invoice_id, s.checkout_url, s.gateway, s.failure_reason, s.created_at, s.updated_at
     FROM subscriptions s
     JOIN subscription_plans p ON p.id = s.plan_id";

fn map_unique_violation(e: sqlx::Error) -> ServiceError {
    if e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
    {
        return AppError::new(ErrorCode::SubscriptionExists).into();
    }
    e.into()
}

impl PgRepository {
    async fn fetch_subscription_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{SUBSCRIPTION_SELECT} WHERE {clause}"))
                .bind(value)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl SubscriptionRepo for PgRepository {
    async fn list_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans ORDER BY price_per_seat, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_plan_by_code(&self, code: &str) -> ServiceResult<Option<SubscriptionPlan>> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_subscription(&self, id: i64) -> ServiceResult<Option<Subscription>> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{SUBSCRIPTION_SELECT} WHERE s.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn find_subscription_by_external_id(
        &self,
        external_id: &str,
    ) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .fetch_subscription_where("s.external_id = $1", external_id)
            .await?)
    }

    async fn find_latest_subscription(
        &self,
        user_id: &str,
    ) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .fetch_subscription_where(
                "s.user_id = $1 ORDER BY s.created_at DESC, s.id DESC LIMIT 1",
                user_id,
            )
            .await?)
    }

    async fn find_open_subscription(&self, user_id: &str) -> ServiceResult<Option<Subscription>> {
        Ok(self
            .fetch_subscription_where(
                "s.user_id = $1 AND s.status IN ('trial', 'pending', 'active') LIMIT 1",
                user_id,
            )
            .await?)
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
        close_trial: Option<i64>,
    ) -> ServiceResult<Subscription> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        if let Some(trial_id) = close_trial {
            sqlx::query(
                "UPDATE subscriptions SET status = 'expired', updated_at = $2
                 WHERE id = $1 AND status = 'trial'",
            )
            .bind(trial_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO subscriptions
                (user_id, plan_id, seats, amount, status, trial_ends_at, external_id,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING id",
        )
        .bind(&subscription.user_id)
        .bind(subscription.plan_id)
        .bind(subscription.seats)
        .bind(subscription.amount)
        .bind(subscription.status.as_db())
        .bind(subscription.trial_ends_at)
        .bind(&subscription.external_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;

        self.find_subscription(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound).into())
    }

    async fn attach_checkout(
        &self,
        id: i64,
        invoice_id: &str,
        checkout_url: &str,
        gateway: &str,
    ) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET invoice_id = $2, checkout_url = $3, gateway = $4, updated_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(invoice_id)
        .bind(checkout_url)
        .bind(gateway)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_paid(&self, id: i64, current_period_end: i64) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = 'active', current_period_end = $2,
                failure_reason = NULL, updated_at = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(current_period_end)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_subscription_status(
        &self,
        id: i64,
        status: SubscriptionStatus,
        failure_reason: Option<&str>,
    ) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = $2, failure_reason = $3, updated_at = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_db())
        .bind(failure_reason)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_webhook_event(
        &self,
        invoice_id: &str,
        event_type: &str,
    ) -> ServiceResult<bool> {
        let result = sqlx::query(
            "INSERT INTO processed_webhook_events (invoice_id, event_type, processed_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (invoice_id, event_type) DO NOTHING",
        )
        .bind(invoice_id)
        .bind(event_type)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn forget_webhook_event(&self, invoice_id: &str, event_type: &str) -> ServiceResult<()> {
        sqlx::query(
            "DELETE FROM processed_webhook_events WHERE invoice_id = $1 AND event_type = $2",
        )
        .bind(invoice_id)
        .bind(event_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
