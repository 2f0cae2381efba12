//! Sniffy Flight - a side-scrolling flap-and-dodge arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacles, collisions, scoring)
//! - `progress`: Post-run progression (milestones, rewards, sequencing)
//! - `game`: Top-level context owning run and cumulative state
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Key-value storage of cross-run progress
//! - `tuning`: Data-driven game balance

pub mod cue;
pub mod game;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod settings;
pub mod sim;
pub mod submission;
pub mod tuning;

pub use cue::Cue;
pub use game::{FrameSnapshot, GameContext};
pub use leaderboard::Leaderboard;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
///
/// Geometry is fixed; balance values here are the defaults for [`Tuning`].
pub mod consts {
    /// Idealized frame duration (ms). One normalized time unit = one 60 Hz frame.
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest normalized delta applied in one tick (tab switches, debugger stalls)
    pub const MAX_FRAME_DELTA: f32 = 4.0;

    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 480.0;
    pub const FIELD_HEIGHT: f32 = 640.0;

    /// Agent sprite: fixed column and square size
    pub const AGENT_X: f32 = 80.0;
    pub const AGENT_SIZE: f32 = 48.0;

    /// Hitbox padding per edge (sprite silhouette is smaller than its square)
    pub const HITBOX_TOP: f32 = 16.0;
    pub const HITBOX_BOTTOM: f32 = 4.0;
    pub const HITBOX_LEADING: f32 = 12.0;
    pub const HITBOX_TRAILING: f32 = 8.0;

    /// Physics (per normalized frame)
    pub const GRAVITY: f32 = 0.25;
    pub const FLAP_VELOCITY: f32 = -5.0;
    pub const MAX_TILT: f32 = 0.6;
    pub const TILT_SMOOTHING: f32 = 0.15;
    pub const WING_MAX_ANGLE: f32 = 0.5; // ~30 degrees
    pub const WING_MAX_VELOCITY: f32 = 0.5;
    pub const WING_REST_ANGLE: f32 = 0.0;
    pub const WING_DAMPING: f32 = 0.15;
    pub const WING_RETURN_SPEED: f32 = 0.08;
    pub const WING_FLAP_BOOST: f32 = -0.25;

    /// Obstacles
    pub const OBSTACLE_WIDTH: f32 = 40.0;
    pub const OBSTACLE_SPEED: f32 = 4.5;
    pub const OBSTACLE_DESPAWN_X: f32 = -50.0;
    pub const SPAWN_BASE_MS: f32 = 1400.0;
    pub const SPAWN_JITTER_MS: f32 = 200.0;
    pub const MIN_GAP: f32 = 110.0;
    pub const GAP_JITTER: f32 = 60.0;
    /// Gap jitter shrinks by `GAP_TIGHTEN_STEP` every `GAP_TIGHTEN_EVERY` passes
    pub const GAP_TIGHTEN_EVERY: u32 = 10;
    pub const GAP_TIGHTEN_STEP: f32 = 10.0;
    /// Vertical margin kept free above and below every gap
    pub const GAP_MARGIN: f32 = 50.0;
    pub const MODE_RESELECT_EVERY: u32 = 5;
    pub const DIFFICULTY_TIER_SIZE: u32 = 10;
    pub const GOLDEN_CHANCE: f32 = 0.04;

    /// Scoring
    pub const PRECISION_SCALE: f32 = 10.0;
    pub const SPARKLE_THRESHOLD: u32 = 5;
    pub const SCORE_TIER_SIZE: u32 = 10;
    pub const GOLDEN_MULTIPLIER: u64 = 3;

    /// Background parallax speed (px per normalized frame)
    pub const PARALLAX_SPEED: f32 = 1.5;

    /// Progression
    pub const CUMULATIVE_STEP: u64 = 100;
    pub const RUN_MILESTONES: [u64; 3] = [1, 100, 200];
    pub const MS_PER_POINT: f32 = 6.0;
    pub const MESSAGE_MS: f32 = 1000.0;
    pub const REVEAL_MS: f32 = 1500.0;
    pub const COLLECTION_COMPLETE_MS: f32 = 3000.0;
    pub const CELEBRATION_SECTION_MS: f32 = 2000.0;
    pub const CELEBRATION_TOP5_MS: f32 = 5000.0;
    pub const CELEBRATION_BEST_MS: f32 = 10000.0;
}

/// Clamp that tolerates inverted bounds by collapsing to `min`
#[inline]
pub fn clamp_f32(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max.max(min))
}
