//! World step
//!
//! Straight-line motion with optional extra gravity. This is all the physics
//! the game needs from its engine.

use super::state::Hazard;

/// Integrate hazard motion over `dt` seconds
pub fn step_hazards(hazards: &mut [Hazard], dt: f32, gravity: f32) {
    for hazard in hazards.iter_mut() {
        hazard.vel.y += gravity * dt;
        hazard.pos += hazard.vel * dt;
    }
}
