//! Pointer and keyboard delivery
//!
//! Platform callbacks feed raw input here; it is republished on the event bus.
//! Pointer events pass through an `InputGate` that the game closes while a
//! run is over or paused. Key presses always go through so pause can be
//! toggled back off.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use glam::Vec2;

use crate::events::{EventBus, GameEvent};

/// Shared on/off switch for pointer input
#[derive(Debug, Clone)]
pub struct InputGate(Rc<Cell<bool>>);

impl Default for InputGate {
    fn default() -> Self {
        Self(Rc::new(Cell::new(true)))
    }
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&self, enabled: bool) {
        if self.0.replace(enabled) != enabled {
            log::debug!("Input {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.0.get()
    }
}

/// Debug snapshot of the input state
#[derive(Debug, Clone, PartialEq)]
pub struct InputStats {
    pub enabled: bool,
    pub position: Vec2,
    pub pointer_down: bool,
    pub pressed_keys: Vec<String>,
    pub any_key_down: bool,
}

/// Republishes platform input on the bus
pub struct InputManager {
    bus: Rc<EventBus>,
    gate: InputGate,
    position: Cell<Vec2>,
    pointer_down: Cell<bool>,
    /// Keys currently held, by `KeyboardEvent.key`
    held: RefCell<BTreeSet<String>>,
}

impl InputManager {
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self {
            bus,
            gate: InputGate::new(),
            position: Cell::new(Vec2::ZERO),
            pointer_down: Cell::new(false),
            held: RefCell::new(BTreeSet::new()),
        }
    }

    /// Handle to the gate, for the game to toggle
    pub fn gate(&self) -> InputGate {
        self.gate.clone()
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        if !self.gate.is_enabled() {
            return;
        }
        self.position.set(Vec2::new(x, y));
        self.bus.publish(GameEvent::PointerMoved { x, y });
    }

    pub fn pointer_down(&self, x: f32, y: f32, button: i16) {
        if !self.gate.is_enabled() {
            return;
        }
        self.pointer_down.set(true);
        self.bus.publish(GameEvent::PointerDown { x, y, button });
    }

    pub fn pointer_up(&self, x: f32, y: f32, button: i16) {
        if !self.gate.is_enabled() {
            return;
        }
        self.pointer_down.set(false);
        self.bus.publish(GameEvent::PointerUp { x, y, button });
    }

    pub fn key_press(&self, key: &str) {
        self.held.borrow_mut().insert(key.to_string());
        self.bus.publish(GameEvent::KeyPressed {
            key: key.to_string(),
        });
    }

    pub fn key_release(&self, key: &str) {
        self.held.borrow_mut().remove(key);
        self.bus.publish(GameEvent::KeyReleased {
            key: key.to_string(),
        });
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.held.borrow().contains(key)
    }

    pub fn is_any_key_down(&self) -> bool {
        !self.held.borrow().is_empty()
    }

    /// Held keys in sorted order
    pub fn pressed_keys(&self) -> Vec<String> {
        self.held.borrow().iter().cloned().collect()
    }

    /// Forget held keys (focus loss never delivers their keyup)
    pub fn clear_keys(&self) {
        self.held.borrow_mut().clear();
    }

    pub fn stats(&self) -> InputStats {
        InputStats {
            enabled: self.gate.is_enabled(),
            position: self.position(),
            pointer_down: self.is_pointer_down(),
            pressed_keys: self.pressed_keys(),
            any_key_down: self.is_any_key_down(),
        }
    }

    /// Last pointer position seen while enabled
    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down.get()
    }
}
