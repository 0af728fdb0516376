use std::collections::BTreeMap;

use serde_json::Value;

use crate::geometry::PercentPoint;
use crate::registry::ModuleRegistry;
use crate::storage::{KeyValueStore, POSITIONS_KEY, write_json};

pub type PositionMap = BTreeMap<String, PercentPoint>;

/// Live module positions, seeded from persisted state or catalog defaults.
/// The in-memory map stays authoritative when persistence fails.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionStore {
    positions: PositionMap,
}

impl PositionStore {
    /// Seed one entry per module. A persisted entry is used only when both
    /// coordinates are finite numbers within `[0, 100]`.
    pub fn initialize(registry: &ModuleRegistry, snapshot: Option<&str>) -> Self {
        let parsed: Option<Value> = snapshot.and_then(|text| match serde_json::from_str(text) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("discarding unreadable `{POSITIONS_KEY}`: {e}");
                None
            }
        });
        let saved = parsed.as_ref().and_then(Value::as_object);
        if parsed.is_some() && saved.is_none() {
            log::warn!("discarding `{POSITIONS_KEY}`: not an object");
        }

        let mut positions = PositionMap::new();
        for m in registry.iter() {
            let restored = saved.and_then(|s| s.get(&m.id)).and_then(|v| {
                let p = parse_entry(v);
                if p.is_none() {
                    log::warn!("discarding malformed saved position for `{}`", m.id);
                }
                p
            });
            positions.insert(m.id.clone(), restored.unwrap_or(m.default_position));
        }
        PositionStore { positions }
    }

    /// Initialize from whatever the store currently holds under [`POSITIONS_KEY`].
    pub fn restore<S: KeyValueStore + ?Sized>(registry: &ModuleRegistry, store: &S) -> Self {
        Self::initialize(registry, store.get(POSITIONS_KEY).as_deref())
    }

    pub fn get(&self, id: &str) -> Option<PercentPoint> {
        self.positions.get(id).copied()
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    /// Replace the entry for `id` and write the whole map through. Returns
    /// `false` for ids the store was not seeded with.
    pub fn commit<S: KeyValueStore + ?Sized>(
        &mut self,
        id: &str,
        position: PercentPoint,
        store: &mut S,
    ) -> bool {
        let Some(entry) = self.positions.get_mut(id) else {
            log::warn!("ignoring position commit for unknown module `{id}`");
            return false;
        };
        *entry = position;
        log::debug!("committed `{id}` at ({:.2}, {:.2})", position.x, position.y);
        write_json(store, POSITIONS_KEY, &self.positions);
        true
    }

    /// Forget the persisted layout and return every module to its default.
    pub fn reset<S: KeyValueStore + ?Sized>(&mut self, registry: &ModuleRegistry, store: &mut S) {
        if let Err(e) = store.remove(POSITIONS_KEY) {
            log::warn!("clearing saved positions failed: {e}");
        }
        *self = Self::initialize(registry, None);
    }
}

fn parse_entry(v: &Value) -> Option<PercentPoint> {
    let obj = v.as_object()?;
    let x = obj.get("x")?.as_f64()?;
    let y = obj.get("y")?.as_f64()?;
    let p = PercentPoint::new(x, y);
    p.is_valid().then_some(p)
}
