//! Per-frame simulation tick
//!
//! Real frame time is normalized against an idealized 60 Hz frame, so a
//! 120 Hz display ticks twice as often with half the delta and the run plays
//! out the same.

use super::collision::{FatalCause, resolve};
use super::generator::advance_spawner;
use super::scoring::score_pass;
use super::state::{RunPhase, RunState};
use crate::consts::*;
use crate::cue::Cue;
use crate::tuning::Tuning;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Flap (click/tap/space)
    pub flap: bool,
    /// Demo mode - a simple controller flaps on the player's behalf
    pub autopilot: bool,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Points scored this tick
    pub points: u64,
    /// Set on the tick the run ended
    pub fatal: Option<FatalCause>,
}

/// Convert elapsed wall-clock milliseconds into normalized frames
#[inline]
pub fn normalize_delta(elapsed_ms: f32) -> f32 {
    (elapsed_ms / FRAME_MS).clamp(0.0, MAX_FRAME_DELTA)
}

/// Tracks the previous frame timestamp and yields elapsed wall-clock time
#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    last_ms: Option<f64>,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock milliseconds since the previous call (first call yields 0)
    pub fn elapsed_ms(&mut self, now_ms: f64) -> f32 {
        let elapsed = match self.last_ms {
            Some(last) => (now_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        elapsed
    }
}

/// Whether the demo controller wants to flap this tick
pub fn autopilot_wants_flap(run: &RunState) -> bool {
    let agent = &run.agent;
    if agent.vy < 0.0 {
        return false;
    }
    // Aim for the lower part of the next gap: a flap carries the agent up ~50px
    let target_y = match run.next_unpassed() {
        Some(next) => next.gap_bottom - agent.size * 0.75,
        None => FIELD_HEIGHT / 2.0,
    };
    agent.pos.y > target_y
}

/// Advance the run by one tick of `delta` normalized frames
pub fn tick(
    run: &mut RunState,
    input: &TickInput,
    tuning: &Tuning,
    delta: f32,
    cues: &mut Vec<Cue>,
) -> TickOutcome {
    if run.phase == RunPhase::Ended {
        return TickOutcome::default();
    }

    let flap = input.flap || (input.autopilot && autopilot_wants_flap(run));
    if flap {
        run.agent.flap(&tuning.physics);
        cues.push(Cue::Flap);
    }

    run.time_ticks += 1;
    run.agent.integrate(&tuning.physics, delta);

    advance_spawner(run, tuning, delta);
    let step = tuning.obstacles.speed * delta;
    for obstacle in &mut run.obstacles {
        obstacle.x -= step;
    }
    run.parallax = (run.parallax + PARALLAX_SPEED * delta) % FIELD_WIDTH;

    let resolution = resolve(run, tuning);
    if let Some(cause) = resolution.fatal {
        run.phase = RunPhase::Ended;
        cues.push(Cue::FatalCollision);
        log::info!(
            "Run ended ({:?}) score={} passed={} ticks={}",
            cause,
            run.score,
            run.passed,
            run.time_ticks
        );
        return TickOutcome {
            points: 0,
            fatal: Some(cause),
        };
    }

    let mut points = 0;
    for idx in resolution.passes {
        let agent_y = run.agent.pos.y;
        let obstacle = &mut run.obstacles[idx];
        let score = score_pass(
            obstacle.gap_top,
            obstacle.gap_bottom,
            agent_y,
            obstacle.golden,
            run.passed,
            &tuning.scoring,
            &tuning.obstacles,
        );
        obstacle.passed = true;
        run.passed += 1;
        run.score += score.points;
        points += score.points;
        cues.push(Cue::Pass {
            points: score.points,
            golden: score.golden,
        });
        if score.sparkle {
            cues.push(Cue::Sparkle);
        }
    }

    run.obstacles.retain(|o| o.x > OBSTACLE_DESPAWN_X);

    TickOutcome {
        points,
        fatal: None,
    }
}
