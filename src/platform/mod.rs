//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (engine clock in ms)
//! - Storage (LocalStorage on web, in-memory natively)
//! - HUD surface (DOM on web, log natively)

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::rc::Rc;

use crate::persistence::KeyValueStore;

/// The best available key-value store for this platform
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Rc<dyn KeyValueStore> {
    match web::LocalStorage::open() {
        Ok(storage) => Rc::new(storage),
        Err(err) => {
            log::warn!("LocalStorage unavailable, scores will not persist: {:#}", err);
            Rc::new(crate::persistence::MemoryStore::new())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Rc<dyn KeyValueStore> {
    Rc::new(crate::persistence::MemoryStore::new())
}
