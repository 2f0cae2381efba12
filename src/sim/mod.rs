//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Normalized time steps only
//! - Seeded RNG only
//! - Stable iteration order (obstacles oldest first)
//! - No rendering or platform dependencies

pub mod collision;
pub mod generator;
pub mod physics;
pub mod scoring;
pub mod state;
pub mod tick;

pub use collision::{Bounds, FatalCause, agent_bounds};
pub use generator::PlacementMode;
pub use scoring::{PassScore, score_pass};
pub use state::{Agent, Obstacle, RunPhase, RunState, Wing};
pub use tick::{SimulationClock, TickInput, TickOutcome, normalize_delta, tick};
