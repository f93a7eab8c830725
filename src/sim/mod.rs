//! Play field simulation
//!
//! Stands in for the 2D engine the game runs on: entities, a repeating timer,
//! the world step and overlap detection. Kept free of rendering and platform
//! dependencies:
//! - Caller-supplied timestep
//! - Seeded RNG only
//! - Stable iteration order (by hazard id)

pub mod collision;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod timer;

pub use collision::{circle_box_overlap, find_overlap, hazard_overlaps_paddle};
pub use spawner::{SpeedChangePolicy, Spawner};
pub use state::{Hazard, Paddle, PlayField};
pub use tick::step_hazards;
pub use timer::RepeatingTimer;
