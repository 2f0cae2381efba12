//! One-shot cues for the presentation layer
//!
//! The core never plays sounds or spawns particles. It records what happened
//! and the host maps each cue to audio/visual feedback.

use serde::{Deserialize, Serialize};

use crate::progress::RankTier;
use crate::progress::catalog::CosmeticId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    /// Player flapped
    Flap,
    /// Run ended by collision or leaving the field
    FatalCollision,
    /// Obstacle passed and scored
    Pass { points: u64, golden: bool },
    /// Precision pass worth a sparkle burst
    Sparkle,
    /// A milestone presentation opened
    MilestoneReached { threshold: u64 },
    /// Rank celebration started
    RankTierReached { tier: RankTier },
    /// Loot box opened by the player
    RewardUnlockClick { reward: Option<CosmeticId> },
    /// Looping progress-bar sound should start
    ProgressLoopStart,
    /// Looping progress-bar sound should stop
    ProgressLoopStop,
    /// Every regular cosmetic is now unlocked
    CollectionComplete,
}
