use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thetai_tier_policy::Tier;

use crate::quota::{ResetOutcome, UserLimitsSnapshot};
use crate::wallet::{PromoCode, UpgradeOutcome, Wallet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementMessageRequest {
    pub user_id: String,
    #[serde(default)]
    pub has_image: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementImageGenRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCheckRequest {
    pub user_id: String,
}

/// Quota gate verdict. Refusals are expected conditions, reported with a
/// stable reason code and the moment the relevant window next resets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaDecisionResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UserLimitsSnapshot>,
}

impl QuotaDecisionResponse {
    pub fn allowed(usage: UserLimitsSnapshot) -> Self {
        Self {
            allowed: true,
            reason: None,
            resets_at: None,
            usage: Some(usage),
        }
    }

    pub fn refused(reason: &str, resets_at: Option<DateTime<Utc>>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
            resets_at,
            usage: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCheckResponse {
    pub usage_reset: bool,
    pub image_gen_reset: bool,
}

impl From<ResetOutcome> for ResetCheckResponse {
    fn from(outcome: ResetOutcome) -> Self {
        Self {
            usage_reset: outcome.usage_reset,
            image_gen_reset: outcome.image_gen_reset,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsResponse {
    pub usage: UserLimitsSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardRequest {
    pub user_id: String,
    pub amount: u32,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendRequest {
    pub user_id: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub user_id: String,
    pub balance: u64,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            user_id: wallet.user_id,
            balance: wallet.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeRequest {
    pub user_id: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeResponse {
    pub user_id: String,
    pub tier: Tier,
    pub price_paid: u32,
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

impl From<UpgradeOutcome> for UpgradeResponse {
    fn from(outcome: UpgradeOutcome) -> Self {
        Self {
            user_id: outcome.user_id,
            tier: outcome.tier,
            price_paid: outcome.price_paid,
            balance: outcome.balance,
            promo_code: outcome.promo_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePromoRequest {
    pub code: String,
    pub discount_percent: u32,
    pub max_uses: u32,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoResponse {
    pub code: String,
    pub discount_percent: u32,
    pub max_uses: u32,
    pub times_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<PromoCode> for PromoResponse {
    fn from(promo: PromoCode) -> Self {
        Self {
            code: promo.code,
            discount_percent: promo.discount_percent,
            max_uses: promo.max_uses,
            times_used: promo.times_used,
            expires_at: promo.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}
