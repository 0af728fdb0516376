use factory_core::storage::{KeyValueStore, MemoryStore};
use factory_core::StoreError;
use web_sys::{Storage, Window};

/// `localStorage` when the browser grants it, otherwise a session-only map.
pub enum WebStorage {
    Local(Storage),
    Session(MemoryStore),
}

impl WebStorage {
    pub fn open(window: &Window) -> Self {
        match window.local_storage() {
            Ok(Some(s)) => WebStorage::Local(s),
            _ => {
                log::warn!("{}; keeping state in memory", StoreError::Unavailable);
                WebStorage::Session(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            WebStorage::Local(s) => s.get_item(key).ok().flatten(),
            WebStorage::Session(m) => m.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            WebStorage::Local(s) => s.set_item(key, value).map_err(|e| StoreError::WriteRejected {
                key: key.to_string(),
                reason: format!("{e:?}"),
            }),
            WebStorage::Session(m) => m.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self {
            WebStorage::Local(s) => s.remove_item(key).map_err(|e| StoreError::WriteRejected {
                key: key.to_string(),
                reason: format!("{e:?}"),
            }),
            WebStorage::Session(m) => m.remove(key),
        }
    }
}
