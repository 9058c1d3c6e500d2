//! Durable key-value backup for context selections.
//!
//! DESIGN
//! ======
//! The registry reads its playbook ids and knowledge-base marks once at
//! construction and writes them back after every change. The browser shell
//! backs this with `localStorage`; tests and the CLI use [`MemoryStore`].
//! Values are JSON arrays of file ids.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::types::FileId;

/// Key holding the playbook file ids.
pub const PLAYBOOK_KEY: &str = "playbookFileIds";
/// Key holding the files marked for the project knowledge base.
pub const KNOWLEDGE_BASE_KEY: &str = "filesMarkedForProject";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage write failed for {key}: {message}")]
    Write { key: String, message: String },
}

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the backing storage rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backing storage rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store with no durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read a file-id list. Missing or malformed values read as empty.
#[must_use]
pub fn load_ids(store: &dyn KeyValueStore, key: &str) -> Vec<FileId> {
    let Some(raw) = store.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<FileId>>(&raw) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored id list is malformed; ignoring");
            Vec::new()
        }
    }
}

/// Write a file-id list. An empty list removes the key.
///
/// # Errors
///
/// Returns the store's error if the write or removal fails.
pub fn save_ids(store: &dyn KeyValueStore, key: &str, ids: &[FileId]) -> Result<(), StoreError> {
    if ids.is_empty() {
        return store.remove(key);
    }
    let raw = serde_json::to_string(ids).map_err(|e| StoreError::Write {
        key: key.to_owned(),
        message: e.to_string(),
    })?;
    store.set(key, &raw)
}
