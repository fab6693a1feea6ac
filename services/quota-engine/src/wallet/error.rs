use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("insufficient TCoins balance: have {balance}, need {required}")]
    InsufficientBalance { balance: u64, required: u64 },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("user {0} is already on the plus tier")]
    AlreadyPlus(String),
    #[error("unknown promo code {0}")]
    UnknownPromo(String),
    #[error("promo code {0} has no uses left")]
    PromoExhausted(String),
    #[error("promo code {0} has expired")]
    PromoExpired(String),
    #[error("promo code {0} already exists")]
    PromoExists(String),
    #[error("invalid promo code: {0}")]
    InvalidPromo(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
