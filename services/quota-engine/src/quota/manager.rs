use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{self, QuotaDatabase, StorageError};

use super::error::QuotaError;
use super::state::UserLimitsSnapshot;

/// Outcome of an explicit reset check: which windows actually rolled over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub usage_reset: bool,
    pub image_gen_reset: bool,
}

/// Gates and accounts for a user's consumption of messages and image
/// generations under the two-tier policy.
///
/// Every operation runs as one transaction against the user's quota row:
/// the embedded window-reset check, the limit check, and the increment
/// commit together, so two concurrent requests for the same user cannot
/// both pass a check against the same stale count. Refusals do not retry;
/// the caller decides whether to try again after the reported reset time.
#[derive(Clone)]
pub struct QuotaManager {
    database: Arc<QuotaDatabase>,
}

impl QuotaManager {
    pub fn new(database: Arc<QuotaDatabase>) -> Self {
        Self { database }
    }

    /// Applies both window resets if elapsed. Idempotent no-op otherwise.
    pub fn check_and_reset_usage(&self, user_id: &str) -> Result<ResetOutcome, QuotaError> {
        let now = Utc::now();
        let outcome = self
            .database
            .transaction::<_, StorageError>(|tx| {
                let mut state = storage::load_or_create_user_state(tx, user_id, now)?;
                let (usage_reset, image_gen_reset) = state.apply_resets(now);
                if usage_reset || image_gen_reset {
                    storage::save_user_state(tx, &state, now)?;
                }
                Ok(ResetOutcome {
                    usage_reset,
                    image_gen_reset,
                })
            })?;

        if outcome.usage_reset || outcome.image_gen_reset {
            debug!(
                user_id,
                usage_reset = outcome.usage_reset,
                image_gen_reset = outcome.image_gen_reset,
                "usage windows reset"
            );
        }
        Ok(outcome)
    }

    /// Returns the current usage snapshot after running the reset check.
    pub fn get_user_limits(&self, user_id: &str) -> Result<UserLimitsSnapshot, QuotaError> {
        let now = Utc::now();
        let snapshot = self
            .database
            .transaction::<_, StorageError>(|tx| {
                let mut state = storage::load_or_create_user_state(tx, user_id, now)?;
                let (usage_reset, image_gen_reset) = state.apply_resets(now);
                if usage_reset || image_gen_reset {
                    storage::save_user_state(tx, &state, now)?;
                }
                Ok(state.snapshot())
            })?;

        Ok(snapshot)
    }

    /// Records one chat message (and one prompt image when `has_image`),
    /// refusing without any counter mutation when either ceiling is hit.
    pub fn increment_message_usage(
        &self,
        user_id: &str,
        has_image: bool,
    ) -> Result<UserLimitsSnapshot, QuotaError> {
        let now = Utc::now();
        let (snapshot, decision) = self
            .database
            .transaction::<_, StorageError>(|tx| {
                let mut state = storage::load_or_create_user_state(tx, user_id, now)?;
                state.apply_resets(now);
                let limits = state.limits();

                // Both ceilings are checked before either counter moves,
                // so a refused prompt image never burns a message.
                let decision = if state.messages.messages_used >= limits.messages_limit {
                    Err(QuotaError::MessagesLimitExceeded {
                        resets_at: state.messages.next_reset(),
                    })
                } else if has_image
                    && state.messages.images_in_prompts_used >= limits.images_prompt_limit
                {
                    Err(QuotaError::ImagesPromptLimitExceeded {
                        resets_at: state.messages.next_reset(),
                    })
                } else {
                    state.messages.record_message(has_image);
                    Ok(())
                };

                // Window resets persist even when the increment is refused.
                storage::save_user_state(tx, &state, now)?;
                Ok((state.snapshot(), decision))
            })?;

        if let Err(refusal) = &decision {
            debug!(user_id, reason = ?refusal.reason_code(), "message increment refused");
        }
        decision?;
        Ok(snapshot)
    }

    /// Records one image generation, refusing with the window's next reset
    /// time when the daily ceiling is hit.
    pub fn increment_image_gen_usage(
        &self,
        user_id: &str,
    ) -> Result<UserLimitsSnapshot, QuotaError> {
        let now = Utc::now();
        let (snapshot, decision) = self
            .database
            .transaction::<_, StorageError>(|tx| {
                let mut state = storage::load_or_create_user_state(tx, user_id, now)?;
                state.apply_resets(now);
                let limits = state.limits();

                let decision = if state.image_gen.images_generated >= limits.images_gen_limit {
                    Err(QuotaError::ImageGenLimitExceeded {
                        resets_at: state.image_gen.next_reset(),
                    })
                } else {
                    state.image_gen.record_generation();
                    Ok(())
                };

                storage::save_user_state(tx, &state, now)?;
                Ok((state.snapshot(), decision))
            })?;

        if let Err(refusal) = &decision {
            debug!(user_id, reason = ?refusal.reason_code(), "image generation refused");
        }
        decision?;
        Ok(snapshot)
    }
}
