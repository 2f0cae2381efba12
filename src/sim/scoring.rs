//! Points awarded for passing an obstacle
//!
//! Passing off-centre pays more than threading the middle: the precision term
//! grows with distance from the gap midpoint and with how tight the gap is.

use crate::tuning::{ObstacleTuning, ScoringTuning};

/// Breakdown of a single scored pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassScore {
    /// Rounded precision term before clamping (drives the sparkle cue)
    pub raw_precision: u32,
    /// Precision multiplier actually applied (at least 1)
    pub precision: u32,
    /// Progressive base multiplier
    pub base: u64,
    pub golden: bool,
    /// Final points added to the run score
    pub points: u64,
    /// Raw precision reached the sparkle threshold
    pub sparkle: bool,
}

/// Unclamped precision term for passing at `agent_y` through a gap
pub fn raw_precision(
    gap_top: f32,
    gap_bottom: f32,
    agent_y: f32,
    scale: f32,
    max_gap: f32,
) -> u32 {
    let gap = gap_bottom - gap_top;
    if gap <= 0.0 || max_gap <= 0.0 {
        return 0;
    }
    let mid = (gap_top + gap_bottom) / 2.0;
    let value = scale * (mid - agent_y).abs() / (gap / 2.0) / (gap / max_gap);
    value.round().max(0.0) as u32
}

/// Base multiplier: +1 every `tier_size` obstacles passed
#[inline]
pub fn base_multiplier(passed: u32, tier_size: u32) -> u64 {
    1 + (passed / tier_size.max(1)) as u64
}

/// Score one pass. `passed` is the number of obstacles passed before this one.
pub fn score_pass(
    gap_top: f32,
    gap_bottom: f32,
    agent_y: f32,
    golden: bool,
    passed: u32,
    scoring: &ScoringTuning,
    obstacles: &ObstacleTuning,
) -> PassScore {
    let raw = raw_precision(
        gap_top,
        gap_bottom,
        agent_y,
        scoring.precision_scale,
        obstacles.max_gap(),
    );
    let precision = raw.max(1);
    let base = base_multiplier(passed, scoring.tier_size);
    let mut points = base * precision as u64;
    if golden {
        points *= scoring.golden_multiplier;
    }
    PassScore {
        raw_precision: raw,
        precision,
        base,
        golden,
        points,
        sparkle: raw >= scoring.sparkle_threshold,
    }
}
