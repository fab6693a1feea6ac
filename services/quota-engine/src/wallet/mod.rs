pub mod error;
pub mod manager;
pub mod types;

pub use error::WalletError;
pub use manager::WalletManager;
pub use types::{PromoCode, UpgradeOutcome, Wallet};
