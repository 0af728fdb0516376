use std::collections::{BTreeMap, HashMap};

use crate::error::StoreError;

/// Key holding the id -> `{x, y}` position snapshot.
pub const POSITIONS_KEY: &str = "modulePositions";
/// Key holding the `"en"` / `"zh"` language tag.
pub const LANGUAGE_KEY: &str = "language";
/// Key holding the id -> URL map of external module links.
pub const LINKS_KEY: &str = "moduleLinks";

/// Best-effort string key-value persistence. Reads never fail; absence and
/// unavailability look the same to callers.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, used when no browser storage is available and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes are all rejected, like a full or disabled `localStorage`.
    pub fn failing() -> Self {
        MemoryStore {
            entries: HashMap::new(),
            fail_writes: true,
        }
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "storage disabled".to_string(),
            });
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Serialize `value` and write it under `key`, logging instead of failing.
pub fn write_json<S, T>(store: &mut S, key: &str, value: &T) -> bool
where
    S: KeyValueStore + ?Sized,
    T: serde::Serialize,
{
    let text = match serde_json::to_string(value) {
        Ok(t) => t,
        Err(source) => {
            let e = StoreError::Serialize {
                key: key.to_string(),
                source,
            };
            log::warn!("{e}");
            return false;
        }
    };
    match store.set(key, &text) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("persisting `{key}` failed: {e}");
            false
        }
    }
}

/// Per-module external link URLs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleLinks {
    links: BTreeMap<String, String>,
}

impl ModuleLinks {
    /// Read the link table, discarding anything that is not a string-valued object entry.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let Some(text) = store.get(LINKS_KEY) else {
            return Self::default();
        };
        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("discarding unreadable `{LINKS_KEY}`: {e}");
                return Self::default();
            }
        };
        let Some(obj) = value.as_object() else {
            log::warn!("discarding `{LINKS_KEY}`: not an object");
            return Self::default();
        };
        let mut links = BTreeMap::new();
        for (id, url) in obj {
            match url.as_str() {
                Some(u) if !u.trim().is_empty() => {
                    links.insert(id.clone(), u.to_string());
                }
                _ => log::warn!("discarding malformed link for `{id}`"),
            }
        }
        ModuleLinks { links }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.links.get(id).map(String::as_str)
    }

    /// Normalize and store `url` for `id`. Returns the stored URL, or `None`
    /// when the input was blank.
    pub fn save<S: KeyValueStore + ?Sized>(
        &mut self,
        id: &str,
        url: &str,
        store: &mut S,
    ) -> Option<String> {
        let url = normalize_url(url)?;
        self.links.insert(id.to_string(), url.clone());
        write_json(store, LINKS_KEY, &self.links);
        Some(url)
    }
}

/// Trim and prefix `https://` when the URL carries no http(s) scheme.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(url.to_string())
    } else {
        Some(format!("https://{url}"))
    }
}
