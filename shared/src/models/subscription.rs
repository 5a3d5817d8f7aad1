//! Subscription & Plan Models

use serde::{Deserialize, Serialize};

/// Subscription lifecycle
///
/// `trial` / `pending` / `active` are open; at most one open subscription
/// exists per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Free trial started at registration
    Trial,
    /// Checkout created, awaiting payment
    Pending,
    /// Paid
    Active,
    /// Invoice expired or billing period over
    Expired,
    /// Payment failed
    Failed,
}

impl SubscriptionStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(Self::Trial),
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Trial | Self::Pending | Self::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// Price per seat per period, in IDR
    pub price_per_seat: i64,
    pub max_employees: i32,
    pub period_days: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,
    pub plan_id: i64,
    pub plan_code: String,
    pub seats: i32,
    /// Total invoice amount in IDR
    pub amount: i64,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<i64>,
    pub current_period_end: Option<i64>,
    /// Our order reference sent to the gateway
    pub external_id: Option<String>,
    /// Gateway invoice / transaction ID
    pub invoice_id: Option<String>,
    pub checkout_url: Option<String>,
    pub gateway: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub plan_code: String,
    pub seats: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub subscription_id: i64,
    pub external_id: String,
    pub checkout_url: String,
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip_and_open() {
        for status in [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Expired,
            SubscriptionStatus::Failed,
        ] {
            assert_eq!(SubscriptionStatus::from_db(status.as_db()), Some(status));
        }
        assert!(SubscriptionStatus::Trial.is_open());
        assert!(!SubscriptionStatus::Expired.is_open());
        assert!(!SubscriptionStatus::Failed.is_open());
    }
}
