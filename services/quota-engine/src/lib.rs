pub mod api;
pub mod config;
pub mod quota;
pub mod storage;
pub mod wallet;

pub use api::{create_router, ApiState};
pub use config::QuotaEngineConfig;
pub use quota::{QuotaError, QuotaManager, UserLimitsSnapshot};
pub use storage::QuotaDatabase;
pub use wallet::{WalletError, WalletManager};
