//! In-memory store for native runs and tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::KeyValueStore;

/// HashMap-backed `KeyValueStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    /// Reject writes (simulates a full or disabled LocalStorage)
    read_only: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.read_only.get() {
            anyhow::bail!("storage is read-only");
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        if self.read_only.get() {
            anyhow::bail!("storage is read-only");
        }
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
