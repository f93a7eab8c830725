//! Dodge the Spiked Balls - a survival-time arcade game
//!
//! Core modules:
//! - `events`: Synchronous publish/subscribe bus for cross-component notifications
//! - `score`: Run timing, best time and session statistics (persisted)
//! - `settings`: Development tuning values with change listeners
//! - `game`: Ready/Playing/Paused/GameOver state machine
//! - `sim`: Play field stand-in for the engine (entities, timer, overlap)
//! - `input`: Pointer/key delivery onto the event bus
//! - `ui`: HUD projection of score and game-over notifications
//! - `persistence`: Key-value storage abstraction with JSON helpers
//! - `platform`: Browser glue (LocalStorage, DOM HUD, clock)

pub mod events;
pub mod game;
pub mod input;
pub mod persistence;
pub mod platform;
pub mod score;
pub mod settings;
pub mod sim;
pub mod ui;

pub use events::{EventBus, GameEvent, SubscriptionId, Topic};
pub use game::{Game, GameConfig, GameState};
pub use score::{GameResult, ScoreStore, SessionStats};
pub use settings::{DevSettings, Preset, SettingKey, SettingValue, SettingsStore};

/// Game configuration constants
pub mod consts {
    /// Play field dimensions (pixels)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Paddle defaults
    pub const PLAYER_SIZE: f32 = 30.0;
    /// Paddle sits this far above the bottom edge
    pub const PLAYER_BOTTOM_OFFSET: f32 = 50.0;
    pub const PLAYER_SPEED: f32 = 400.0;

    /// Hazard (spiked ball) defaults
    pub const BALL_SIZE: f32 = 20.0;
    pub const BALL_SPEED: f32 = 200.0;
    /// Milliseconds between spawns
    pub const BALL_SPAWN_RATE: f64 = 1000.0;

    /// World gravity (pixels/s², added to hazard fall speed)
    pub const GRAVITY: f32 = 0.0;

    /// Largest frame delta fed to the world step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Format seconds for display with two decimals ("3.14s")
pub fn format_time(seconds: f64) -> String {
    format!("{:.2}s", seconds)
}

/// Clamp helper mirroring paddle movement bounds
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
