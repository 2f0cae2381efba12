//! Run state and core simulation types
//!
//! Everything a single run mutates lives in [`RunState`]. It is created when a
//! run starts and folded into cumulative progress when the run ends.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generator::{PlacementMode, roll_spawn_interval};
use crate::consts::*;
use crate::tuning::Tuning;

/// Phase of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Agent alive, obstacles scrolling
    Running,
    /// Fatal collision or out of bounds. Terminal.
    Ended,
}

/// Wing flap state (angular spring around a rest angle)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wing {
    /// Current angle (radians)
    pub angle: f32,
    /// Angular velocity (radians per normalized frame)
    pub velocity: f32,
}

/// The controllable agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Centre position; x stays on a fixed column
    pub pos: Vec2,
    /// Vertical velocity (positive = down)
    pub vy: f32,
    /// Smoothed body tilt (radians)
    pub tilt: f32,
    pub wing: Wing,
    /// Square sprite size
    pub size: f32,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            pos: Vec2::new(AGENT_X, FIELD_HEIGHT / 2.0),
            vy: 0.0,
            tilt: 0.0,
            wing: Wing::default(),
            size: AGENT_SIZE,
        }
    }
}

/// Colours for the base-multiplier tier an obstacle spawned under
const TIER_COLORS: [u32; 6] = [0x3c9a3c, 0x2f9f9a, 0x3569c9, 0x8a45c7, 0xc9459a, 0xd23c2c];

/// Visual colour for a multiplier tier (last colour repeats)
pub fn tier_color(tier: u32) -> u32 {
    TIER_COLORS[(tier as usize).min(TIER_COLORS.len() - 1)]
}

/// A paired top/bottom barrier with a gap the agent must pass through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Left edge
    pub x: f32,
    pub gap_top: f32,
    pub gap_bottom: f32,
    /// Scored already (at most once)
    pub passed: bool,
    /// Rare bonus variant
    pub golden: bool,
    /// Base-multiplier tier active at spawn
    pub tier: u32,
    /// Colour captured at spawn (visual only)
    pub tier_color: u32,
}

impl Obstacle {
    #[inline]
    pub fn gap_size(&self) -> f32 {
        self.gap_bottom - self.gap_top
    }

    #[inline]
    pub fn gap_mid(&self) -> f32 {
        (self.gap_top + self.gap_bottom) / 2.0
    }

    /// Horizontal centre for a given obstacle width
    #[inline]
    pub fn center_x(&self, width: f32) -> f32 {
        self.x + width / 2.0
    }
}

/// Complete state of one run (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub agent: Agent,
    /// Live obstacles, oldest first
    pub obstacles: Vec<Obstacle>,
    /// Run score
    pub score: u64,
    /// Obstacles passed (drives difficulty and base multiplier)
    pub passed: u32,
    /// Obstacles spawned (drives placement reselection cadence)
    pub spawned: u32,
    /// Active gap placement distribution
    pub mode: PlacementMode,
    /// Milliseconds accumulated toward the next spawn
    pub spawn_timer_ms: f32,
    /// Target interval for the next spawn
    pub next_spawn_ms: f32,
    /// Background scroll offset, wrapped to the field width
    pub parallax: f32,
    pub phase: RunPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: u32,
}

impl RunState {
    /// Create a new run with the given seed
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let next_spawn_ms = roll_spawn_interval(&mut rng, &tuning.obstacles);
        Self {
            seed,
            rng,
            agent: Agent::default(),
            obstacles: Vec::new(),
            score: 0,
            passed: 0,
            spawned: 0,
            mode: PlacementMode::Uniform,
            spawn_timer_ms: 0.0,
            next_spawn_ms,
            parallax: 0.0,
            phase: RunPhase::Running,
            time_ticks: 0,
            next_id: 1,
        }
    }

    /// Allocate a new obstacle ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Next obstacle the agent still has to clear (for autopilot)
    pub fn next_unpassed(&self) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| !o.passed)
    }
}
