//! Agent physics: gravity, tilt smoothing and the wing spring
//!
//! All rates are per normalized 60 Hz frame; `delta` scales them.

use super::state::Agent;
use crate::tuning::PhysicsTuning;

/// Tilt the body should approach for a given vertical velocity
#[inline]
pub fn tilt_target(vy: f32, max_tilt: f32) -> f32 {
    crate::clamp_f32(vy / 10.0, -max_tilt, max_tilt)
}

impl Agent {
    /// Integrate one tick
    pub fn integrate(&mut self, physics: &PhysicsTuning, delta: f32) {
        self.vy += physics.gravity * delta;
        self.pos.y += self.vy * delta;

        // First-order low-pass toward the velocity-derived target
        let target = tilt_target(self.vy, physics.max_tilt);
        self.tilt += (target - self.tilt) * physics.tilt_smoothing;

        let wing = &mut self.wing;
        wing.angle += wing.velocity * delta;
        wing.velocity *= (1.0 - physics.wing_damping * delta).max(0.0);
        wing.angle += (physics.wing_rest_angle - wing.angle) * physics.wing_return_speed;
        wing.angle = crate::clamp_f32(wing.angle, -physics.wing_max_angle, physics.wing_max_angle);
        wing.velocity = crate::clamp_f32(
            wing.velocity,
            -physics.wing_max_velocity,
            physics.wing_max_velocity,
        );
    }

    /// Instantaneous upward impulse
    pub fn flap(&mut self, physics: &PhysicsTuning) {
        self.vy = physics.flap_velocity;
        self.wing.velocity = physics.wing_flap_boost;
    }
}
