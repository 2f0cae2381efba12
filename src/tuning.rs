//! Data-driven game balance
//!
//! Every value defaults to the matching constant in [`crate::consts`], so a
//! tuning file only needs the fields it overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Problems found while loading or validating a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be between 0 and 1 (got {value:.3})")]
    NotProbability { field: &'static str, value: f32 },
    #[error("largest gap {max_gap:.1} does not fit the playable height {available:.1}")]
    GapTooLarge { max_gap: f32, available: f32 },
    #[error("spawn jitter {jitter:.1}ms must be smaller than the base interval {base:.1}ms")]
    SpawnJitter { base: f32, jitter: f32 },
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
    #[error("run milestones must be non-empty, non-zero and strictly ascending")]
    RunMilestones,
}

/// Hitbox padding per edge of the agent sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hitbox {
    pub top: f32,
    pub bottom: f32,
    /// Edge facing oncoming obstacles
    pub leading: f32,
    pub trailing: f32,
}

impl Default for Hitbox {
    fn default() -> Self {
        Self {
            top: HITBOX_TOP,
            bottom: HITBOX_BOTTOM,
            leading: HITBOX_LEADING,
            trailing: HITBOX_TRAILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub flap_velocity: f32,
    pub max_tilt: f32,
    pub tilt_smoothing: f32,
    pub wing_max_angle: f32,
    pub wing_max_velocity: f32,
    pub wing_rest_angle: f32,
    pub wing_damping: f32,
    pub wing_return_speed: f32,
    pub wing_flap_boost: f32,
    pub hitbox: Hitbox,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            flap_velocity: FLAP_VELOCITY,
            max_tilt: MAX_TILT,
            tilt_smoothing: TILT_SMOOTHING,
            wing_max_angle: WING_MAX_ANGLE,
            wing_max_velocity: WING_MAX_VELOCITY,
            wing_rest_angle: WING_REST_ANGLE,
            wing_damping: WING_DAMPING,
            wing_return_speed: WING_RETURN_SPEED,
            wing_flap_boost: WING_FLAP_BOOST,
            hitbox: Hitbox::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub width: f32,
    pub speed: f32,
    pub spawn_base_ms: f32,
    pub spawn_jitter_ms: f32,
    pub min_gap: f32,
    pub gap_jitter: f32,
    pub gap_tighten_every: u32,
    pub gap_tighten_step: f32,
    pub margin: f32,
    pub mode_reselect_every: u32,
    pub difficulty_tier_size: u32,
    pub golden_chance: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            width: OBSTACLE_WIDTH,
            speed: OBSTACLE_SPEED,
            spawn_base_ms: SPAWN_BASE_MS,
            spawn_jitter_ms: SPAWN_JITTER_MS,
            min_gap: MIN_GAP,
            gap_jitter: GAP_JITTER,
            gap_tighten_every: GAP_TIGHTEN_EVERY,
            gap_tighten_step: GAP_TIGHTEN_STEP,
            margin: GAP_MARGIN,
            mode_reselect_every: MODE_RESELECT_EVERY,
            difficulty_tier_size: DIFFICULTY_TIER_SIZE,
            golden_chance: GOLDEN_CHANCE,
        }
    }
}

impl ObstacleTuning {
    /// Theoretical largest gap (used to normalize precision scoring)
    pub fn max_gap(&self) -> f32 {
        self.min_gap + self.gap_jitter
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    pub precision_scale: f32,
    pub sparkle_threshold: u32,
    pub tier_size: u32,
    pub golden_multiplier: u64,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            precision_scale: PRECISION_SCALE,
            sparkle_threshold: SPARKLE_THRESHOLD,
            tier_size: SCORE_TIER_SIZE,
            golden_multiplier: GOLDEN_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressTuning {
    pub cumulative_step: u64,
    pub run_milestones: Vec<u64>,
    pub ms_per_point: f32,
    pub message_ms: f32,
    pub reveal_ms: f32,
    pub collection_complete_ms: f32,
    pub celebration_section_ms: f32,
    pub celebration_top5_ms: f32,
    pub celebration_best_ms: f32,
}

impl Default for ProgressTuning {
    fn default() -> Self {
        Self {
            cumulative_step: CUMULATIVE_STEP,
            run_milestones: RUN_MILESTONES.to_vec(),
            ms_per_point: MS_PER_POINT,
            message_ms: MESSAGE_MS,
            reveal_ms: REVEAL_MS,
            collection_complete_ms: COLLECTION_COMPLETE_MS,
            celebration_section_ms: CELEBRATION_SECTION_MS,
            celebration_top5_ms: CELEBRATION_TOP5_MS,
            celebration_best_ms: CELEBRATION_BEST_MS,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub obstacles: ObstacleTuning,
    pub scoring: ScoringTuning,
    pub progress: ProgressTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning table and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject tables the simulation cannot honour
    pub fn validate(&self) -> Result<(), TuningError> {
        let obstacles = &self.obstacles;
        positive("obstacles.width", obstacles.width)?;
        positive("obstacles.speed", obstacles.speed)?;
        positive("obstacles.spawn_base_ms", obstacles.spawn_base_ms)?;
        positive("obstacles.min_gap", obstacles.min_gap)?;
        if obstacles.gap_jitter < 0.0 {
            return Err(TuningError::NotPositive {
                field: "obstacles.gap_jitter",
                value: obstacles.gap_jitter,
            });
        }
        if obstacles.spawn_jitter_ms < 0.0 || obstacles.spawn_jitter_ms >= obstacles.spawn_base_ms
        {
            return Err(TuningError::SpawnJitter {
                base: obstacles.spawn_base_ms,
                jitter: obstacles.spawn_jitter_ms,
            });
        }
        let available = FIELD_HEIGHT - 2.0 * obstacles.margin;
        if obstacles.max_gap() > available {
            return Err(TuningError::GapTooLarge {
                max_gap: obstacles.max_gap(),
                available,
            });
        }
        probability("obstacles.golden_chance", obstacles.golden_chance)?;
        positive("physics.max_tilt", self.physics.max_tilt)?;
        positive("physics.wing_max_angle", self.physics.wing_max_angle)?;
        positive("physics.wing_max_velocity", self.physics.wing_max_velocity)?;
        probability("physics.tilt_smoothing", self.physics.tilt_smoothing)?;
        probability("physics.wing_return_speed", self.physics.wing_return_speed)?;
        nonzero("obstacles.gap_tighten_every", obstacles.gap_tighten_every)?;
        nonzero("obstacles.mode_reselect_every", obstacles.mode_reselect_every)?;
        nonzero("obstacles.difficulty_tier_size", obstacles.difficulty_tier_size)?;
        nonzero("scoring.tier_size", self.scoring.tier_size)?;
        if self.progress.cumulative_step == 0 {
            return Err(TuningError::ZeroCount {
                field: "progress.cumulative_step",
            });
        }
        positive("progress.ms_per_point", self.progress.ms_per_point)?;

        let milestones = &self.progress.run_milestones;
        let ascending = milestones.windows(2).all(|w| w[0] < w[1]);
        if milestones.is_empty() || milestones[0] == 0 || !ascending {
            return Err(TuningError::RunMilestones);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::NotProbability { field, value })
    }
}

fn nonzero(field: &'static str, value: u32) -> Result<(), TuningError> {
    if value == 0 {
        Err(TuningError::ZeroCount { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
        assert_eq!(Tuning::default().obstacles.max_gap(), MIN_GAP + GAP_JITTER);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "physics": { "gravity": 0.3 } }"#).unwrap();
        assert_eq!(tuning.physics.gravity, 0.3);
        assert_eq!(tuning.physics.flap_velocity, FLAP_VELOCITY);
        assert_eq!(tuning.progress.run_milestones, RUN_MILESTONES.to_vec());
    }

    #[test]
    fn test_rejects_oversized_gap() {
        let err = Tuning::from_json(r#"{ "obstacles": { "min_gap": 600.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::GapTooLarge { .. }));
    }

    #[test]
    fn test_rejects_unsorted_milestones() {
        let err =
            Tuning::from_json(r#"{ "progress": { "run_milestones": [100, 50] } }"#).unwrap_err();
        assert!(matches!(err, TuningError::RunMilestones));
    }

    #[test]
    fn test_rejects_negative_max_tilt() {
        let err = Tuning::from_json(r#"{ "physics": { "max_tilt": -0.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::NotPositive {
                field: "physics.max_tilt",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_nan_wing_limits() {
        let mut tuning = Tuning::default();
        tuning.physics.wing_max_velocity = f32::NAN;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::NotPositive {
                field: "physics.wing_max_velocity",
                ..
            })
        ));
        tuning.physics.wing_max_velocity = 0.5;
        tuning.physics.wing_max_angle = 0.0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
