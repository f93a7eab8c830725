//! Key-value persistence
//!
//! Everything the game keeps between sessions is a JSON value under a fixed
//! key. Reads never fail: a missing or corrupt value falls back to the
//! caller's default and is logged. Writes are synchronous and best-effort.

mod memory;

pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage keys
pub mod keys {
    pub const BEST_TIME: &str = "best-time";
    pub const SESSION_STATS: &str = "session-stats";
    pub const DEV_SETTINGS: &str = "dev-settings";
}

/// Minimal string key-value store (LocalStorage-shaped)
pub trait KeyValueStore {
    /// Fetch a raw value, `Ok(None)` when absent
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;

    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

/// Load a JSON value, returning `default` when absent or unreadable
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(err) => {
            log::warn!("Failed to read {} from storage: {:#}", key, err);
            return default;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Failed to parse {} from storage, using default: {}", key, err);
            default
        }
    }
}

/// Store a value as JSON. Failures are logged, not returned.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            log::warn!("Failed to serialize {}: {}", key, err);
            return;
        }
    };

    if let Err(err) = store.set_item(key, &json) {
        log::warn!("Failed to save {} to storage: {:#}", key, err);
    }
}
