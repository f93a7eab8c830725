//! Hazard spawning and lifecycle
//!
//! One hazard per timer firing at a random x across the top edge. Hazards
//! that fall past the bottom are swept out each frame.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Hazard, PlayField};
use super::timer::RepeatingTimer;
use crate::consts::BALL_SIZE;

/// What a speed change does to hazards already falling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedChangePolicy {
    /// Only hazards spawned after the change use the new speed
    #[default]
    NextSpawnOnly,
    /// Live hazards are retargeted to the new speed as well
    Broadcast,
}

/// Owns the live hazards and the spawn timer
#[derive(Debug, Clone)]
pub struct Spawner {
    timer: RepeatingTimer,
    speed: f32,
    policy: SpeedChangePolicy,
    rng: Pcg32,
    hazards: Vec<Hazard>,
    next_id: u32,
}

impl Spawner {
    /// Spawner with a paused timer
    pub fn new(interval_ms: f64, speed: f32, policy: SpeedChangePolicy, seed: u64) -> Self {
        Self {
            timer: RepeatingTimer::new(interval_ms, true),
            speed,
            policy,
            rng: Pcg32::seed_from_u64(seed),
            hazards: Vec::new(),
            next_id: 1,
        }
    }

    /// Start or stop the spawn timer
    pub fn set_active(&mut self, active: bool) {
        self.timer.set_paused(!active);
    }

    pub fn is_active(&self) -> bool {
        !self.timer.is_paused()
    }

    /// Advance the spawn timer, spawning once per firing. Returns the new ids.
    pub fn advance(&mut self, dt_ms: f64, field: &PlayField) -> Vec<u32> {
        let fired = self.timer.advance(dt_ms);
        (0..fired).map(|_| self.on_tick(field).id).collect()
    }

    /// Create one hazard at a random x along the top edge
    pub fn on_tick(&mut self, field: &PlayField) -> Hazard {
        let min_x = BALL_SIZE;
        let max_x = (field.width - BALL_SIZE).max(min_x);
        let x = self.rng.random_range(min_x..=max_x);

        let hazard = Hazard::new(self.next_id, x, self.speed);
        self.next_id += 1;
        self.hazards.push(hazard);
        hazard
    }

    /// Remove hazards past the far boundary, returning their ids
    pub fn sweep(&mut self, field: &PlayField) -> Vec<u32> {
        let mut removed = Vec::new();
        self.hazards.retain(|h| {
            if h.is_out_of_bounds(field) {
                removed.push(h.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drop every live hazard and any partial timer progress
    pub fn clear(&mut self) -> usize {
        let count = self.hazards.len();
        self.hazards.clear();
        self.timer.reset();
        count
    }

    /// New spawn interval, effective from the next firing
    pub fn set_interval(&mut self, interval_ms: f64) {
        self.timer.set_interval(interval_ms);
    }

    pub fn interval(&self) -> f64 {
        self.timer.interval()
    }

    /// New fall speed for future hazards (and live ones under `Broadcast`)
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if self.policy == SpeedChangePolicy::Broadcast {
            for hazard in &mut self.hazards {
                hazard.vel.y = speed;
            }
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_policy(&mut self, policy: SpeedChangePolicy) {
        self.policy = policy;
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn hazards_mut(&mut self) -> &mut [Hazard] {
        &mut self.hazards
    }
}
