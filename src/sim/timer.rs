//! Repeating timer primitive
//!
//! Fires every `interval_ms` of accumulated, unpaused time.

use serde::{Deserialize, Serialize};

/// Upper bound on firings reported by one `advance` (a long stall should not
/// flood the field)
pub const MAX_FIRINGS_PER_ADVANCE: u32 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatingTimer {
    interval_ms: f64,
    elapsed_ms: f64,
    paused: bool,
}

impl RepeatingTimer {
    pub fn new(interval_ms: f64, paused: bool) -> Self {
        Self {
            interval_ms: interval_ms.max(1.0),
            elapsed_ms: 0.0,
            paused,
        }
    }

    /// Accumulate time, returning how many times the timer fired
    pub fn advance(&mut self, dt_ms: f64) -> u32 {
        if self.paused || dt_ms <= 0.0 {
            return 0;
        }

        self.elapsed_ms += dt_ms;
        let mut fired = 0;
        while self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            fired += 1;
            if fired == MAX_FIRINGS_PER_ADVANCE {
                self.elapsed_ms = 0.0;
                break;
            }
        }
        fired
    }

    /// Change the interval; applies from the next firing on
    pub fn set_interval(&mut self, interval_ms: f64) {
        self.interval_ms = interval_ms.max(1.0);
    }

    pub fn interval(&self) -> f64 {
        self.interval_ms
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drop accumulated time
    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
    }
}
