use std::sync::Arc;

pub mod handlers;
pub mod router;
pub mod types;

pub use router::create_router;
pub use types::*;

use crate::config::QuotaEngineConfig;
use crate::quota::QuotaManager;
use crate::wallet::WalletManager;

pub struct ApiState {
    pub quota: Arc<QuotaManager>,
    pub wallet: Arc<WalletManager>,
    pub config: Arc<QuotaEngineConfig>,
}

impl ApiState {
    pub fn new(
        quota: Arc<QuotaManager>,
        wallet: Arc<WalletManager>,
        config: QuotaEngineConfig,
    ) -> Self {
        Self {
            quota,
            wallet,
            config: Arc::new(config),
        }
    }
}
