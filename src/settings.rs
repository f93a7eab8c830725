//! Development tuning settings
//!
//! Persisted under `dev-settings`. Listeners registered per key run after
//! every successful `set`, so the running game can pick up new values.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::persistence::{KeyValueStore, keys, load_json, save_json};

/// Tunable parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    BallSpawnRate,
    BallSpeed,
    Gravity,
    PlayerSpeed,
    ShowDebugInfo,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::BallSpawnRate,
        SettingKey::BallSpeed,
        SettingKey::Gravity,
        SettingKey::PlayerSpeed,
        SettingKey::ShowDebugInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::BallSpawnRate => "ballSpawnRate",
            SettingKey::BallSpeed => "ballSpeed",
            SettingKey::Gravity => "gravity",
            SettingKey::PlayerSpeed => "playerSpeed",
            SettingKey::ShowDebugInfo => "showDebugInfo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        SettingKey::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

/// A setting value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Number(f64),
    Bool(bool),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Named tuning presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    Easy,
    #[default]
    Normal,
    Hard,
    Chaos,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Easy => "easy",
            Preset::Normal => "normal",
            Preset::Hard => "hard",
            Preset::Chaos => "chaos",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Preset::Easy),
            "normal" => Some(Preset::Normal),
            "hard" => Some(Preset::Hard),
            "chaos" => Some(Preset::Chaos),
            _ => None,
        }
    }

    /// (spawn rate ms, ball speed, gravity, player speed)
    fn values(&self) -> (f64, f64, f64, f64) {
        match self {
            Preset::Easy => (2000.0, 100.0, 0.0, 600.0),
            Preset::Normal => (1000.0, 200.0, 0.0, 400.0),
            Preset::Hard => (500.0, 300.0, 100.0, 300.0),
            Preset::Chaos => (200.0, 500.0, 200.0, 200.0),
        }
    }
}

/// Live-tunable gameplay values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevSettings {
    /// Milliseconds between hazard spawns
    pub ball_spawn_rate: f64,
    /// Hazard fall speed (pixels/s)
    pub ball_speed: f64,
    /// Extra downward acceleration (pixels/s²)
    pub gravity: f64,
    pub player_speed: f64,
    pub show_debug_info: bool,
}

impl Default for DevSettings {
    fn default() -> Self {
        Self {
            ball_spawn_rate: consts::BALL_SPAWN_RATE,
            ball_speed: consts::BALL_SPEED as f64,
            gravity: consts::GRAVITY as f64,
            player_speed: consts::PLAYER_SPEED as f64,
            show_debug_info: false,
        }
    }
}

impl DevSettings {
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::BallSpawnRate => SettingValue::Number(self.ball_spawn_rate),
            SettingKey::BallSpeed => SettingValue::Number(self.ball_speed),
            SettingKey::Gravity => SettingValue::Number(self.gravity),
            SettingKey::PlayerSpeed => SettingValue::Number(self.player_speed),
            SettingKey::ShowDebugInfo => SettingValue::Bool(self.show_debug_info),
        }
    }

    /// Write a value if it has the right type and range
    fn apply(&mut self, key: SettingKey, value: SettingValue) -> bool {
        match (key, value) {
            (SettingKey::BallSpawnRate, SettingValue::Number(n)) if n.is_finite() && n > 0.0 => {
                self.ball_spawn_rate = n;
            }
            (SettingKey::BallSpeed, SettingValue::Number(n)) if n.is_finite() && n >= 0.0 => {
                self.ball_speed = n;
            }
            (SettingKey::Gravity, SettingValue::Number(n)) if n.is_finite() => {
                self.gravity = n;
            }
            (SettingKey::PlayerSpeed, SettingValue::Number(n)) if n.is_finite() && n >= 0.0 => {
                self.player_speed = n;
            }
            (SettingKey::ShowDebugInfo, SettingValue::Bool(b)) => {
                self.show_debug_info = b;
            }
            _ => return false,
        }
        true
    }

    pub fn from_preset(preset: Preset) -> Self {
        let (ball_spawn_rate, ball_speed, gravity, player_speed) = preset.values();
        Self {
            ball_spawn_rate,
            ball_speed,
            gravity,
            player_speed,
            show_debug_info: false,
        }
    }
}

type ChangeListener = Box<dyn FnMut(SettingValue)>;

/// Owner of the dev settings and their change listeners
pub struct SettingsStore {
    store: Rc<dyn KeyValueStore>,
    settings: DevSettings,
    listeners: HashMap<SettingKey, Vec<ChangeListener>>,
}

impl SettingsStore {
    /// Load settings, falling back to defaults
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        let settings = load_json(store.as_ref(), keys::DEV_SETTINGS, DevSettings::default());
        log::info!("Dev settings loaded: {:?}", settings);
        Self {
            store,
            settings,
            listeners: HashMap::new(),
        }
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        self.settings.get(key)
    }

    pub fn all(&self) -> DevSettings {
        self.settings
    }

    /// Register a listener for one key
    pub fn on_change<F>(&mut self, key: SettingKey, listener: F)
    where
        F: FnMut(SettingValue) + 'static,
    {
        self.listeners.entry(key).or_default().push(Box::new(listener));
    }

    /// Update one setting, persist, and notify. Returns false on a rejected value.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> bool {
        if !self.settings.apply(key, value) {
            log::warn!("Rejected dev setting {} = {}", key.as_str(), value);
            return false;
        }

        save_json(self.store.as_ref(), keys::DEV_SETTINGS, &self.settings);
        log::info!("Dev setting updated: {} = {}", key.as_str(), value);
        self.notify(key);
        true
    }

    /// Apply a preset's four numeric values
    pub fn apply_preset(&mut self, preset: Preset) {
        let target = DevSettings::from_preset(preset);
        for key in [
            SettingKey::BallSpawnRate,
            SettingKey::BallSpeed,
            SettingKey::Gravity,
            SettingKey::PlayerSpeed,
        ] {
            self.set(key, target.get(key));
        }
        log::info!("Applied \"{}\" preset", preset.as_str());
    }

    /// Forget persisted overrides and notify every key
    pub fn reset(&mut self) {
        if let Err(err) = self.store.remove_item(keys::DEV_SETTINGS) {
            log::warn!("Failed to clear dev settings: {:#}", err);
        }
        self.settings = DevSettings::default();
        for key in SettingKey::ALL {
            self.notify(key);
        }
        log::info!("Dev settings reset to defaults");
    }

    fn notify(&mut self, key: SettingKey) {
        let value = self.settings.get(key);
        if let Some(listeners) = self.listeners.get_mut(&key) {
            for listener in listeners.iter_mut() {
                listener(value);
            }
        }
    }
}
