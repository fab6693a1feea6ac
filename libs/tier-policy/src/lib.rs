//! Subscription tier policy for ThetAI.
//!
//! Maps a subscription tier to the static usage ceilings the quota engine
//! enforces: messages and images-in-prompt per six-hour window, and image
//! generations per twenty-four-hour window. These numbers must stay in
//! lockstep with the externally advertised plan copy.

use serde::{Deserialize, Serialize};

/// Subscription level determining quota ceilings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Plus,
}

impl Tier {
    pub fn from_is_plus(is_plus: bool) -> Self {
        if is_plus {
            Tier::Plus
        } else {
            Tier::Free
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tier::Free => "free",
            Tier::Plus => "plus",
        }
    }
}

/// Static ceilings for one tier. Limits are inclusive: a user sitting
/// exactly at a limit is refused the next action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierLimits {
    /// Chat messages per six-hour window.
    pub messages_limit: u32,
    /// Images attached to prompts per six-hour window.
    pub images_prompt_limit: u32,
    /// Image generations per twenty-four-hour window.
    pub images_gen_limit: u32,
}

pub const FREE_LIMITS: TierLimits = TierLimits {
    messages_limit: 50,
    images_prompt_limit: 10,
    images_gen_limit: 5,
};

pub const PLUS_LIMITS: TierLimits = TierLimits {
    messages_limit: 1000,
    images_prompt_limit: 100,
    images_gen_limit: 15,
};

/// Returns the ceilings for a tier.
pub fn limits_for(tier: Tier) -> TierLimits {
    match tier {
        Tier::Free => FREE_LIMITS,
        Tier::Plus => PLUS_LIMITS,
    }
}
