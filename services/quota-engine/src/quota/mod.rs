pub mod error;
pub mod manager;
pub mod state;

pub use error::QuotaError;
pub use manager::{QuotaManager, ResetOutcome};
pub use state::{ImageGenWindow, MessageWindow, UserLimitsSnapshot, UserQuotaState};

/// Rolling window for chat messages and images attached to prompts.
pub const MESSAGE_WINDOW_HOURS: i64 = 6;
/// Rolling window for image generations.
pub const IMAGE_GEN_WINDOW_HOURS: i64 = 24;
