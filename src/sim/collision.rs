//! Overlap detection between the paddle and hazards
//!
//! Hazards are circles, the paddle is an axis-aligned square. Overlap is the
//! usual closest-point test.

use glam::Vec2;

use super::state::{Hazard, Paddle};

/// Whether a circle overlaps an axis-aligned box
pub fn circle_box_overlap(center: Vec2, radius: f32, box_min: Vec2, box_max: Vec2) -> bool {
    let closest = center.clamp(box_min, box_max);
    center.distance_squared(closest) <= radius * radius
}

pub fn hazard_overlaps_paddle(hazard: &Hazard, paddle: &Paddle) -> bool {
    let (min, max) = paddle.bounds();
    circle_box_overlap(hazard.pos, hazard.radius, min, max)
}

/// First hazard (lowest id) touching the paddle
pub fn find_overlap(paddle: &Paddle, hazards: &[Hazard]) -> Option<u32> {
    hazards
        .iter()
        .filter(|h| hazard_overlaps_paddle(h, paddle))
        .map(|h| h.id)
        .min()
}
