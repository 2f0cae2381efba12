//! Collision detection between the agent and obstacles
//!
//! The agent's hitbox is its sprite square shrunk by per-edge padding. The
//! leading edge gets more padding than the trailing edge so grazing the front
//! of a bar feels fair against the sprite silhouette.

use serde::{Deserialize, Serialize};

use super::state::{Agent, Obstacle, RunState};
use crate::consts::FIELD_HEIGHT;
use crate::tuning::{Hitbox, Tuning};

/// Axis-aligned box (screen space, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Bounds {
    /// Horizontal overlap with the span `[x, x + width]` (touching does not count)
    #[inline]
    pub fn overlaps_span(&self, x: f32, width: f32) -> bool {
        self.right > x && self.left < x + width
    }
}

/// Padded hitbox of the agent
pub fn agent_bounds(agent: &Agent, hitbox: &Hitbox) -> Bounds {
    let half = agent.size / 2.0;
    Bounds {
        left: agent.pos.x - half + hitbox.trailing,
        right: agent.pos.x + half - hitbox.leading,
        top: agent.pos.y - half + hitbox.top,
        bottom: agent.pos.y + half - hitbox.bottom,
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatalCause {
    /// Agent centre left the play field
    OutOfBounds,
    /// Agent hit the bar of the given obstacle
    Obstacle { id: u32 },
}

/// Contact between the agent and a single obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// No overlap, or overlapping inside the gap with nothing to score
    Clear,
    /// Overlapping a bar
    Hit,
    /// Inside the gap and just crossed the obstacle centre for the first time
    Pass,
}

/// Classify the agent against one obstacle
pub fn obstacle_contact(
    bounds: &Bounds,
    agent_x: f32,
    obstacle: &Obstacle,
    width: f32,
) -> Contact {
    if !bounds.overlaps_span(obstacle.x, width) {
        return Contact::Clear;
    }
    if bounds.top < obstacle.gap_top || bounds.bottom > obstacle.gap_bottom {
        return Contact::Hit;
    }
    if !obstacle.passed && agent_x > obstacle.center_x(width) {
        return Contact::Pass;
    }
    Contact::Clear
}

/// Agent centre above the top or below the bottom of the field
#[inline]
pub fn out_of_bounds(agent: &Agent) -> bool {
    agent.pos.y < 0.0 || agent.pos.y > FIELD_HEIGHT
}

/// Outcome of one collision pass over the whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub fatal: Option<FatalCause>,
    /// Indices into `run.obstacles` passed this tick (ascending)
    pub passes: Vec<usize>,
}

/// Test the agent against the field bounds and every live obstacle
pub fn resolve(run: &RunState, tuning: &Tuning) -> Resolution {
    if out_of_bounds(&run.agent) {
        return Resolution {
            fatal: Some(FatalCause::OutOfBounds),
            passes: Vec::new(),
        };
    }

    let bounds = agent_bounds(&run.agent, &tuning.physics.hitbox);
    let width = tuning.obstacles.width;
    let mut passes = Vec::new();
    for (idx, obstacle) in run.obstacles.iter().enumerate() {
        match obstacle_contact(&bounds, run.agent.pos.x, obstacle, width) {
            Contact::Hit => {
                return Resolution {
                    fatal: Some(FatalCause::Obstacle { id: obstacle.id }),
                    passes: Vec::new(),
                };
            }
            Contact::Pass => passes.push(idx),
            Contact::Clear => {}
        }
    }
    Resolution {
        fatal: None,
        passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::tier_color;
    use glam::Vec2;

    fn obstacle(x: f32, top: f32, bottom: f32) -> Obstacle {
        Obstacle {
            id: 1,
            x,
            gap_top: top,
            gap_bottom: bottom,
            passed: false,
            golden: false,
            tier: 0,
            tier_color: tier_color(0),
        }
    }

    fn agent_at(y: f32) -> Agent {
        Agent {
            pos: Vec2::new(AGENT_X, y),
            ..Agent::default()
        }
    }

    #[test]
    fn test_hitbox_is_asymmetric() {
        let hitbox = Hitbox::default();
        let agent = agent_at(300.0);
        let b = agent_bounds(&agent, &hitbox);
        let half = AGENT_SIZE / 2.0;
        // Leading edge is more lenient than trailing
        assert!((agent.pos.x + half - b.right) > (b.left - (agent.pos.x - half)));
        assert_eq!(b.top, 300.0 - half + HITBOX_TOP);
        assert_eq!(b.bottom, 300.0 + half - HITBOX_BOTTOM);
    }

    #[test]
    fn test_no_overlap_is_clear() {
        let b = agent_bounds(&agent_at(300.0), &Hitbox::default());
        let o = obstacle(300.0, 0.0, 10.0);
        assert_eq!(obstacle_contact(&b, AGENT_X, &o, OBSTACLE_WIDTH), Contact::Clear);
    }

    #[test]
    fn test_hits_top_bar() {
        let agent = agent_at(200.0);
        let b = agent_bounds(&agent, &Hitbox::default());
        // Gap starts below the agent's padded top
        let o = obstacle(AGENT_X - 10.0, b.top + 5.0, b.top + 200.0);
        assert_eq!(obstacle_contact(&b, AGENT_X, &o, OBSTACLE_WIDTH), Contact::Hit);
    }

    #[test]
    fn test_hits_bottom_bar() {
        let b = agent_bounds(&agent_at(200.0), &Hitbox::default());
        let o = obstacle(AGENT_X - 10.0, b.top - 100.0, b.bottom - 1.0);
        assert_eq!(obstacle_contact(&b, AGENT_X, &o, OBSTACLE_WIDTH), Contact::Hit);
    }

    #[test]
    fn test_padding_forgives_sprite_overlap() {
        let agent = agent_at(200.0);
        let b = agent_bounds(&agent, &Hitbox::default());
        // Sprite top (176) is above the gap but the padded box (192) is inside
        let o = obstacle(AGENT_X - 30.0, 190.0, 300.0);
        assert_eq!(obstacle_contact(&b, AGENT_X, &o, OBSTACLE_WIDTH), Contact::Pass);
    }

    #[test]
    fn test_pass_only_after_center() {
        let b = agent_bounds(&agent_at(300.0), &Hitbox::default());
        // Centre at AGENT_X + 5: not yet passed
        let before = obstacle(AGENT_X + 5.0 - OBSTACLE_WIDTH / 2.0, 200.0, 400.0);
        assert_eq!(obstacle_contact(&b, AGENT_X, &before, OBSTACLE_WIDTH), Contact::Clear);
        let after = obstacle(AGENT_X - 5.0 - OBSTACLE_WIDTH / 2.0, 200.0, 400.0);
        assert_eq!(obstacle_contact(&b, AGENT_X, &after, OBSTACLE_WIDTH), Contact::Pass);
    }

    #[test]
    fn test_already_passed_is_not_rescored() {
        let b = agent_bounds(&agent_at(300.0), &Hitbox::default());
        let mut o = obstacle(AGENT_X - 30.0, 200.0, 400.0);
        o.passed = true;
        assert_eq!(obstacle_contact(&b, AGENT_X, &o, OBSTACLE_WIDTH), Contact::Clear);
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(out_of_bounds(&agent_at(-1.0)));
        assert!(out_of_bounds(&agent_at(FIELD_HEIGHT + 1.0)));
        assert!(!out_of_bounds(&agent_at(FIELD_HEIGHT / 2.0)));
    }

    #[test]
    fn test_resolve_reports_fatal_first() {
        let tuning = Tuning::default();
        let mut run = RunState::new(1, &tuning);
        run.agent.pos.y = FIELD_HEIGHT + 10.0;
        run.obstacles.push(obstacle(AGENT_X - 30.0, 0.0, FIELD_HEIGHT));
        let res = resolve(&run, &tuning);
        assert_eq!(res.fatal, Some(FatalCause::OutOfBounds));
        assert!(res.passes.is_empty());
    }
}
