//! Procedural obstacle generation
//!
//! Gap size tightens step-wise as the player passes obstacles. Gap placement
//! follows one of four distributions, reselected every few spawns with a bias
//! toward the harder ones as difficulty rises.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Obstacle, RunState, tier_color};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH, FRAME_MS};
use crate::tuning::{ObstacleTuning, Tuning};

/// Probability law for a gap's vertical centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Anywhere in the valid range
    Uniform,
    /// Two peaks at 25% / 75% of the valid range
    Bimodal,
    /// Clustered near the top quarter
    TopSkewed,
    /// Clustered near the bottom quarter
    BottomSkewed,
}

impl PlacementMode {
    pub const ALL: [PlacementMode; 4] = [
        PlacementMode::Uniform,
        PlacementMode::Bimodal,
        PlacementMode::TopSkewed,
        PlacementMode::BottomSkewed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementMode::Uniform => "uniform",
            PlacementMode::Bimodal => "bimodal",
            PlacementMode::TopSkewed => "top_skewed",
            PlacementMode::BottomSkewed => "bottom_skewed",
        }
    }

    /// Sample a gap centre as a fraction of the valid range, clamped to [0, 1]
    pub fn sample_fraction<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let raw = match self {
            PlacementMode::Uniform => rng.random::<f32>(),
            PlacementMode::Bimodal => {
                let peak = if rng.random_bool(0.5) { 0.25 } else { 0.75 };
                peak + gaussian(rng) * BIMODAL_SPREAD
            }
            PlacementMode::TopSkewed => 0.25 + gaussian(rng) * SKEW_SPREAD,
            PlacementMode::BottomSkewed => 0.75 + gaussian(rng) * SKEW_SPREAD,
        };
        raw.clamp(0.0, 1.0)
    }
}

const BIMODAL_SPREAD: f32 = 0.08;
const SKEW_SPREAD: f32 = 0.12;

/// Highest difficulty tier (weights stop changing after this)
pub const MAX_DIFFICULTY_TIER: u32 = 2;

/// Difficulty tier for a number of passed obstacles
pub fn difficulty_tier(passed: u32, tier_size: u32) -> u32 {
    (passed / tier_size.max(1)).min(MAX_DIFFICULTY_TIER)
}

/// Selection weights per mode, in [`PlacementMode::ALL`] order
pub fn mode_weights(tier: u32) -> [u32; 4] {
    match tier {
        0 => [70, 10, 10, 10],
        1 => [25, 25, 25, 25],
        _ => [10, 40, 25, 25],
    }
}

/// Weighted pick of a placement mode for a difficulty tier
pub fn select_mode<R: Rng + ?Sized>(rng: &mut R, tier: u32) -> PlacementMode {
    let weights = mode_weights(tier);
    let total: u32 = weights.iter().sum();
    let mut roll = rng.random_range(0..total);
    for (mode, weight) in PlacementMode::ALL.iter().zip(weights) {
        if roll < weight {
            return *mode;
        }
        roll -= weight;
    }
    PlacementMode::Uniform
}

/// Standard normal sample (Box–Muller)
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // u1 in (0, 1] so ln never sees zero
    let u1 = 1.0 - rng.random::<f32>();
    let u2 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// Random gap jitter still available after `passed` obstacles
pub fn gap_jitter_range(passed: u32, tuning: &ObstacleTuning) -> f32 {
    let steps = (passed / tuning.gap_tighten_every.max(1)) as f32;
    (tuning.gap_jitter - steps * tuning.gap_tighten_step).max(0.0)
}

pub fn roll_gap_size<R: Rng + ?Sized>(rng: &mut R, passed: u32, tuning: &ObstacleTuning) -> f32 {
    tuning.min_gap + rng.random::<f32>() * gap_jitter_range(passed, tuning)
}

/// Valid range of gap centres for a gap of the given size
pub fn center_bounds(gap: f32, tuning: &ObstacleTuning) -> (f32, f32) {
    let lo = tuning.margin + gap / 2.0;
    let hi = (FIELD_HEIGHT - tuning.margin - gap / 2.0).max(lo);
    (lo, hi)
}

/// Next spawn interval: base ± uniform jitter
pub fn roll_spawn_interval<R: Rng + ?Sized>(rng: &mut R, tuning: &ObstacleTuning) -> f32 {
    let jitter = (rng.random::<f32>() * 2.0 - 1.0) * tuning.spawn_jitter_ms;
    tuning.spawn_base_ms + jitter
}

/// Sampled gap geometry before it becomes an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSpec {
    pub top: f32,
    pub bottom: f32,
    pub golden: bool,
}

/// Sample one gap for the given progress and placement mode
pub fn sample_gap<R: Rng + ?Sized>(
    rng: &mut R,
    passed: u32,
    mode: PlacementMode,
    tuning: &ObstacleTuning,
) -> GapSpec {
    let gap = roll_gap_size(rng, passed, tuning);
    let (lo, hi) = center_bounds(gap, tuning);
    let center = lo + mode.sample_fraction(rng) * (hi - lo);
    let center = crate::clamp_f32(center, lo, hi);
    let golden = rng.random::<f32>() < tuning.golden_chance;
    GapSpec {
        top: center - gap / 2.0,
        bottom: center + gap / 2.0,
        golden,
    }
}

/// Spawn an obstacle at the right edge, reselecting the placement mode on cadence
pub fn spawn_obstacle(run: &mut RunState, tuning: &Tuning) {
    let obstacles = &tuning.obstacles;
    if run.spawned % obstacles.mode_reselect_every.max(1) == 0 {
        let tier = difficulty_tier(run.passed, obstacles.difficulty_tier_size);
        let mode = select_mode(&mut run.rng, tier);
        if mode != run.mode {
            log::debug!("Placement {} -> {} (tier {})", run.mode.as_str(), mode.as_str(), tier);
        }
        run.mode = mode;
    }

    let gap = sample_gap(&mut run.rng, run.passed, run.mode, obstacles);
    let tier = run.passed / tuning.scoring.tier_size.max(1);
    let id = run.next_entity_id();
    run.obstacles.push(Obstacle {
        id,
        x: FIELD_WIDTH,
        gap_top: gap.top,
        gap_bottom: gap.bottom,
        passed: false,
        golden: gap.golden,
        tier,
        tier_color: tier_color(tier),
    });
    run.spawned += 1;

    if gap.golden {
        log::debug!("Golden obstacle #{} spawned", id);
    }
}

/// Advance the spawn timer; spawns when the interval elapses
pub fn advance_spawner(run: &mut RunState, tuning: &Tuning, delta: f32) {
    run.spawn_timer_ms += delta * FRAME_MS;
    if run.spawn_timer_ms >= run.next_spawn_ms {
        spawn_obstacle(run, tuning);
        run.spawn_timer_ms = 0.0;
        run.next_spawn_ms = roll_spawn_interval(&mut run.rng, &tuning.obstacles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_gap_clearance_every_mode() {
        let tuning = ObstacleTuning::default();
        let mut rng = Pcg32::seed_from_u64(42);
        for mode in PlacementMode::ALL {
            for i in 0..10_000u32 {
                let passed = i % 120;
                let gap = sample_gap(&mut rng, passed, mode, &tuning);
                assert!(gap.bottom - gap.top >= tuning.min_gap - 1e-3);
                assert!(gap.top >= tuning.margin - 1e-3);
                assert!(gap.bottom <= FIELD_HEIGHT - tuning.margin + 1e-3);
            }
        }
    }

    #[test]
    fn test_jitter_tightens_stepwise_to_zero() {
        let tuning = ObstacleTuning::default();
        assert_eq!(gap_jitter_range(0, &tuning), tuning.gap_jitter);
        assert_eq!(gap_jitter_range(9, &tuning), tuning.gap_jitter);
        assert_eq!(
            gap_jitter_range(10, &tuning),
            tuning.gap_jitter - tuning.gap_tighten_step
        );
        assert_eq!(gap_jitter_range(10_000, &tuning), 0.0);
    }

    #[test]
    fn test_spawn_interval_bounded() {
        let tuning = ObstacleTuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..1000 {
            let interval = roll_spawn_interval(&mut rng, &tuning);
            assert!(interval >= tuning.spawn_base_ms - tuning.spawn_jitter_ms);
            assert!(interval <= tuning.spawn_base_ms + tuning.spawn_jitter_ms);
        }
    }

    #[test]
    fn test_weights_shift_with_tier() {
        let easy = mode_weights(0);
        let hard = mode_weights(MAX_DIFFICULTY_TIER);
        assert!(easy[0] > easy[1] + easy[2] + easy[3]);
        assert!(hard[0] < hard[1] + hard[2] + hard[3]);
        let mid = mode_weights(1);
        assert!(mid.iter().all(|w| *w == mid[0]));
        assert_eq!(difficulty_tier(1000, 10), MAX_DIFFICULTY_TIER);
    }

    #[test]
    fn test_select_mode_favours_uniform_early() {
        let mut rng = Pcg32::seed_from_u64(11);
        let uniform = (0..2000)
            .filter(|_| select_mode(&mut rng, 0) == PlacementMode::Uniform)
            .count();
        assert!(uniform > 1200, "uniform picked {uniform} times");
    }

    #[test]
    fn test_skewed_modes_lean_their_way() {
        let mut rng = Pcg32::seed_from_u64(5);
        let n = 4000;
        let top: f32 = (0..n)
            .map(|_| PlacementMode::TopSkewed.sample_fraction(&mut rng))
            .sum::<f32>()
            / n as f32;
        let bottom: f32 = (0..n)
            .map(|_| PlacementMode::BottomSkewed.sample_fraction(&mut rng))
            .sum::<f32>()
            / n as f32;
        assert!(top < 0.35 && bottom > 0.65, "top {top}, bottom {bottom}");
    }

    #[test]
    fn test_bimodal_avoids_middle() {
        let mut rng = Pcg32::seed_from_u64(9);
        let middle = (0..4000)
            .map(|_| PlacementMode::Bimodal.sample_fraction(&mut rng))
            .filter(|f| (0.45..0.55).contains(f))
            .count();
        assert!(middle < 100, "{middle} samples landed mid-field");
    }

    #[test]
    fn test_spawner_fires_on_interval() {
        let tuning = Tuning::default();
        let mut run = RunState::new(1, &tuning);
        let frames_needed = run.next_spawn_ms / FRAME_MS;
        advance_spawner(&mut run, &tuning, frames_needed * 0.5);
        assert!(run.obstacles.is_empty());
        advance_spawner(&mut run, &tuning, frames_needed * 0.6);
        assert_eq!(run.obstacles.len(), 1);
        assert_eq!(run.spawned, 1);
        assert_eq!(run.spawn_timer_ms, 0.0);
        assert_eq!(run.obstacles[0].x, FIELD_WIDTH);
    }

    proptest! {
        #[test]
        fn prop_fraction_in_unit_range(seed in any::<u64>(), mode_idx in 0usize..4) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let f = PlacementMode::ALL[mode_idx].sample_fraction(&mut rng);
            prop_assert!((0.0..=1.0).contains(&f));
        }
    }
}
