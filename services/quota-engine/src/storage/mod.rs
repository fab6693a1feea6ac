pub mod database;
pub mod error;
pub mod schema;

pub use database::{
    insert_promo, load_or_create_user_state, load_or_create_wallet, load_promo, load_user_state,
    load_wallet, save_promo, save_user_state, save_wallet, QuotaDatabase,
};
pub use error::StorageError;

pub const QUOTA_DB_FILENAME: &str = "thetai.db";
pub const USER_QUOTAS_TABLE: &str = "user_quotas";
pub const WALLETS_TABLE: &str = "wallets";
pub const PROMO_CODES_TABLE: &str = "promo_codes";
