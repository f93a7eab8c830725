//! Play field entities
//!
//! The paddle and the falling hazards, in screen coordinates (y grows down).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp;
use crate::consts::*;

/// Play field bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayField {
    pub width: f32,
    pub height: f32,
}

impl Default for PlayField {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
        }
    }
}

impl PlayField {
    /// Hazards below this line have left the field
    pub fn far_boundary(&self, hazard_size: f32) -> f32 {
        self.height + hazard_size
    }
}

/// The player's paddle (square, centered on `pos`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    pub size: f32,
}

impl Paddle {
    /// Paddle centered horizontally near the bottom edge
    pub fn new(field: &PlayField) -> Self {
        Self {
            pos: Vec2::new(field.width / 2.0, field.height - PLAYER_BOTTOM_OFFSET),
            size: PLAYER_SIZE,
        }
    }

    /// Horizontal range the paddle center may occupy
    pub fn x_bounds(&self, field: &PlayField) -> (f32, f32) {
        let half = self.size / 2.0;
        (half, (field.width - half).max(half))
    }

    /// Clamp a requested x into the field
    pub fn clamp_x(&self, x: f32, field: &PlayField) -> f32 {
        let (min, max) = self.x_bounds(field);
        clamp(x, min, max)
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let half = Vec2::splat(self.size / 2.0);
        (self.pos - half, self.pos + half)
    }
}

/// A falling spiked ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Hazard {
    pub fn new(id: u32, x: f32, speed: f32) -> Self {
        Self {
            id,
            pos: Vec2::new(x, -BALL_SIZE),
            vel: Vec2::new(0.0, speed),
            radius: BALL_SIZE / 2.0,
        }
    }

    /// Whether the hazard has fallen past the bottom of the field
    pub fn is_out_of_bounds(&self, field: &PlayField) -> bool {
        self.pos.y > field.far_boundary(self.radius * 2.0)
    }
}
