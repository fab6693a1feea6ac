use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::QuotaEngineConfig;
use crate::storage::{self, QuotaDatabase};

use super::error::WalletError;
use super::types::{PromoCode, UpgradeOutcome, Wallet};

/// TCoins accounting: mini-game rewards in, tier upgrades and spends out.
///
/// Like the quota manager, every operation is one transaction, so a spend
/// cannot race another spend past the balance check, and an upgrade debits
/// the wallet and flips the subscription flag atomically.
#[derive(Clone)]
pub struct WalletManager {
    database: Arc<QuotaDatabase>,
    plus_price_tcoins: u32,
}

impl WalletManager {
    pub fn new(database: Arc<QuotaDatabase>, config: &QuotaEngineConfig) -> Self {
        Self {
            database,
            plus_price_tcoins: config.plus_price_tcoins,
        }
    }

    pub fn balance(&self, user_id: &str) -> Result<Wallet, WalletError> {
        let now = Utc::now();
        self.database
            .transaction::<_, WalletError>(|tx| Ok(storage::load_or_create_wallet(tx, user_id, now)?))
    }

    /// Credits TCoins earned from a mini-game (or other reward source).
    pub fn award(&self, user_id: &str, amount: u32, source: &str) -> Result<Wallet, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount(
                "award amount must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        let wallet = self.database.transaction::<_, WalletError>(|tx| {
            let mut wallet = storage::load_or_create_wallet(tx, user_id, now)?;
            wallet.balance = wallet.balance.saturating_add(u64::from(amount));
            storage::save_wallet(tx, &wallet, now)?;
            Ok(wallet)
        })?;

        info!(user_id, amount, source, balance = wallet.balance, "awarded TCoins");
        Ok(wallet)
    }

    /// Debits TCoins, refusing without mutation when the balance is short.
    pub fn spend(&self, user_id: &str, amount: u32) -> Result<Wallet, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount(
                "spend amount must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        let wallet = self.database.transaction::<_, WalletError>(|tx| {
            let mut wallet = storage::load_or_create_wallet(tx, user_id, now)?;
            let required = u64::from(amount);
            if wallet.balance < required {
                return Err(WalletError::InsufficientBalance {
                    balance: wallet.balance,
                    required,
                });
            }
            wallet.balance -= required;
            storage::save_wallet(tx, &wallet, now)?;
            Ok(wallet)
        })?;

        info!(user_id, amount, balance = wallet.balance, "spent TCoins");
        Ok(wallet)
    }

    /// Upgrades a user to Plus, debiting the (optionally discounted) price
    /// and flipping the subscription flag in the same transaction. Usage
    /// counters and window anchors are untouched: the upgrade only changes
    /// which ceilings apply from now on.
    pub fn upgrade_to_plus(
        &self,
        user_id: &str,
        promo_code: Option<&str>,
    ) -> Result<UpgradeOutcome, WalletError> {
        let now = Utc::now();
        let outcome = self.database.transaction::<_, WalletError>(|tx| {
            let mut state = storage::load_or_create_user_state(tx, user_id, now)?;
            if state.is_plus {
                return Err(WalletError::AlreadyPlus(user_id.to_string()));
            }

            let mut wallet = storage::load_or_create_wallet(tx, user_id, now)?;
            let (price, applied_promo) = match promo_code {
                Some(code) => {
                    let mut promo = storage::load_promo(tx, code)?
                        .ok_or_else(|| WalletError::UnknownPromo(code.to_string()))?;
                    if promo.is_expired(now) {
                        return Err(WalletError::PromoExpired(code.to_string()));
                    }
                    if promo.is_exhausted() {
                        return Err(WalletError::PromoExhausted(code.to_string()));
                    }
                    let price = promo.discounted_price(self.plus_price_tcoins);
                    promo.times_used += 1;
                    storage::save_promo(tx, &promo)?;
                    (price, Some(promo.code))
                }
                None => (self.plus_price_tcoins, None),
            };

            let required = u64::from(price);
            if wallet.balance < required {
                return Err(WalletError::InsufficientBalance {
                    balance: wallet.balance,
                    required,
                });
            }
            wallet.balance -= required;
            state.is_plus = true;

            storage::save_wallet(tx, &wallet, now)?;
            storage::save_user_state(tx, &state, now)?;

            Ok(UpgradeOutcome {
                user_id: user_id.to_string(),
                tier: state.tier(),
                price_paid: price,
                balance: wallet.balance,
                promo_code: applied_promo,
            })
        })?;

        info!(
            user_id,
            price_paid = outcome.price_paid,
            promo = outcome.promo_code.as_deref().unwrap_or("none"),
            balance = outcome.balance,
            "upgraded user to plus"
        );
        Ok(outcome)
    }

    /// Registers a promo code. Admin surface; codes are immutable except
    /// for their use count.
    pub fn create_promo(
        &self,
        code: &str,
        discount_percent: u32,
        max_uses: u32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PromoCode, WalletError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(WalletError::InvalidPromo("code cannot be empty".to_string()));
        }
        if discount_percent == 0 || discount_percent > 100 {
            return Err(WalletError::InvalidPromo(
                "discount_percent must be between 1 and 100".to_string(),
            ));
        }
        if max_uses == 0 {
            return Err(WalletError::InvalidPromo(
                "max_uses must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        let promo = PromoCode {
            code: code.to_string(),
            discount_percent,
            max_uses,
            times_used: 0,
            expires_at,
            created_at: now,
        };

        self.database.transaction::<_, WalletError>(|tx| {
            if storage::load_promo(tx, &promo.code)?.is_some() {
                return Err(WalletError::PromoExists(promo.code.clone()));
            }
            storage::insert_promo(tx, &promo)?;
            Ok(())
        })?;

        info!(code = %promo.code, discount_percent, max_uses, "created promo code");
        Ok(promo)
    }
}
