use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thetai_tier_policy::{limits_for, Tier, TierLimits};

use super::{IMAGE_GEN_WINDOW_HOURS, MESSAGE_WINDOW_HOURS};

/// Six-hour window covering chat messages and images attached to prompts.
/// Both counters reset together when the window elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageWindow {
    pub messages_used: u32,
    pub images_in_prompts_used: u32,
    pub reset_at: DateTime<Utc>,
}

impl MessageWindow {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            messages_used: 0,
            images_in_prompts_used: 0,
            reset_at: now,
        }
    }

    /// Zeroes both counters and re-anchors the window if it has elapsed.
    /// No-op (and returns false) while the window is still open.
    pub fn reset_if_elapsed(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.reset_at >= Duration::hours(MESSAGE_WINDOW_HOURS) {
            self.messages_used = 0;
            self.images_in_prompts_used = 0;
            self.reset_at = now;
            true
        } else {
            false
        }
    }

    pub fn next_reset(&self) -> DateTime<Utc> {
        self.reset_at + Duration::hours(MESSAGE_WINDOW_HOURS)
    }

    pub fn record_message(&mut self, has_image: bool) {
        self.messages_used += 1;
        if has_image {
            self.images_in_prompts_used += 1;
        }
    }
}

/// Twenty-four-hour window for image generations. Resets independently of
/// the message window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenWindow {
    pub images_generated: u32,
    pub reset_at: DateTime<Utc>,
}

impl ImageGenWindow {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            images_generated: 0,
            reset_at: now,
        }
    }

    pub fn reset_if_elapsed(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.reset_at >= Duration::hours(IMAGE_GEN_WINDOW_HOURS) {
            self.images_generated = 0;
            self.reset_at = now;
            true
        } else {
            false
        }
    }

    pub fn next_reset(&self) -> DateTime<Utc> {
        self.reset_at + Duration::hours(IMAGE_GEN_WINDOW_HOURS)
    }

    pub fn record_generation(&mut self) {
        self.images_generated += 1;
    }
}

/// Per-user quota row: subscription flag plus the two independent usage
/// windows. Created lazily the first time the engine touches a user and
/// mutated only inside a single storage transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuotaState {
    pub user_id: String,
    pub is_plus: bool,
    pub messages: MessageWindow,
    pub image_gen: ImageGenWindow,
    pub created_at: DateTime<Utc>,
}

impl UserQuotaState {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_plus: false,
            messages: MessageWindow::new(now),
            image_gen: ImageGenWindow::new(now),
            created_at: now,
        }
    }

    pub fn tier(&self) -> Tier {
        Tier::from_is_plus(self.is_plus)
    }

    pub fn limits(&self) -> TierLimits {
        limits_for(self.tier())
    }

    /// Applies both window resets independently. Returns which windows
    /// actually reset.
    pub fn apply_resets(&mut self, now: DateTime<Utc>) -> (bool, bool) {
        let usage_reset = self.messages.reset_if_elapsed(now);
        let image_gen_reset = self.image_gen.reset_if_elapsed(now);
        (usage_reset, image_gen_reset)
    }

    pub fn snapshot(&self) -> UserLimitsSnapshot {
        let limits = self.limits();
        UserLimitsSnapshot {
            user_id: self.user_id.clone(),
            tier: self.tier(),
            messages_used: self.messages.messages_used,
            messages_limit: limits.messages_limit,
            messages_remaining: remaining(limits.messages_limit, self.messages.messages_used),
            images_in_prompts_used: self.messages.images_in_prompts_used,
            images_prompt_limit: limits.images_prompt_limit,
            images_prompt_remaining: remaining(
                limits.images_prompt_limit,
                self.messages.images_in_prompts_used,
            ),
            images_generated_today: self.image_gen.images_generated,
            images_gen_limit: limits.images_gen_limit,
            images_gen_remaining: remaining(limits.images_gen_limit, self.image_gen.images_generated),
            usage_resets_at: self.messages.next_reset(),
            image_gen_resets_at: self.image_gen.next_reset(),
        }
    }
}

/// Point-in-time view served to the settings UI: usage, tier ceilings,
/// remaining headroom, and when each window next resets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLimitsSnapshot {
    pub user_id: String,
    pub tier: Tier,
    pub messages_used: u32,
    pub messages_limit: u32,
    pub messages_remaining: i64,
    pub images_in_prompts_used: u32,
    pub images_prompt_limit: u32,
    pub images_prompt_remaining: i64,
    pub images_generated_today: u32,
    pub images_gen_limit: u32,
    pub images_gen_remaining: i64,
    pub usage_resets_at: DateTime<Utc>,
    pub image_gen_resets_at: DateTime<Utc>,
}

// Remaining is reported signed and unclamped: a tier downgrade that left
// usage above the new ceiling shows up as negative headroom.
fn remaining(limit: u32, used: u32) -> i64 {
    i64::from(limit) - i64::from(used)
}
