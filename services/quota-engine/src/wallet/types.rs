use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thetai_tier_policy::Tier;

/// TCoins balance for one user. Balances never go negative: spending is
/// an atomic check-then-debit inside one storage transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: String,
    pub balance: u64,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            balance: 0,
            created_at: now,
        }
    }
}

/// Discount code applied to the Plus upgrade price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    pub code: String,
    pub discount_percent: u32,
    pub max_uses: u32,
    pub times_used: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Integer discount math: a 20% code on 500 TCoins yields 400.
    pub fn discounted_price(&self, base_price: u32) -> u32 {
        base_price - base_price * self.discount_percent / 100
    }

    pub fn is_exhausted(&self) -> bool {
        self.times_used >= self.max_uses
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// Result of a successful Plus upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeOutcome {
    pub user_id: String,
    pub tier: Tier,
    pub price_paid: u32,
    pub balance: u64,
    pub promo_code: Option<String>,
}
