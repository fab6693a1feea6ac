use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::StorageError;

/// Refusals are expected business conditions, not faults: they carry the
/// moment the relevant window next resets so callers can tell users when
/// to try again. Storage failures are a separate, non-quota fault.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("message limit reached, resets at {resets_at}")]
    MessagesLimitExceeded { resets_at: DateTime<Utc> },
    #[error("image prompt limit reached, resets at {resets_at}")]
    ImagesPromptLimitExceeded { resets_at: DateTime<Utc> },
    #[error("image generation limit reached, resets at {resets_at}")]
    ImageGenLimitExceeded { resets_at: DateTime<Utc> },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl QuotaError {
    /// Stable reason code carried on the wire for refusals.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            QuotaError::MessagesLimitExceeded { .. } => Some("messages_limit"),
            QuotaError::ImagesPromptLimitExceeded { .. } => Some("images_prompt_limit"),
            QuotaError::ImageGenLimitExceeded { .. } => Some("images_gen_limit"),
            QuotaError::Storage(_) => None,
        }
    }

    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        match self {
            QuotaError::MessagesLimitExceeded { resets_at }
            | QuotaError::ImagesPromptLimitExceeded { resets_at }
            | QuotaError::ImageGenLimitExceeded { resets_at } => Some(*resets_at),
            QuotaError::Storage(_) => None,
        }
    }
}
