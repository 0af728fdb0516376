use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CatalogError;
use crate::geometry::PercentPoint;

/// Separator between namespace path segments.
pub const PATH_SEPARATOR: char = '/';

const BUILTIN_CATALOG: &str = include_str!("../assets/modules.json");

/// Display-only telemetry-like field of a module.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub value: String,
    pub protocol: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub build_time: Option<String>,
    pub value_creation: Option<String>,
    pub features: Option<String>,
}

/// Highlighted bullet shown by modules with a dedicated popup layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialFeature {
    pub key: String,
    pub icon: String,
    pub en: String,
    pub zh: String,
}

/// One visualized subsystem. Immutable once the registry is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "position")]
    pub default_position: PercentPoint,
    #[serde(rename = "path", deserialize_with = "deserialize_path", serialize_with = "serialize_path")]
    pub namespace_path: Vec<String>,
    #[serde(rename = "links", default)]
    pub linked_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub metrics: Option<Metrics>,
    #[serde(rename = "image")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub special_features: Vec<SpecialFeature>,
}

impl ModuleRecord {
    /// Namespace path joined with [`PATH_SEPARATOR`].
    pub fn joined_path(&self) -> String {
        join_path(&self.namespace_path)
    }

    /// Key used by the localization tables: the display name without whitespace.
    pub fn name_key(&self) -> String {
        self.name.split_whitespace().collect()
    }
}

/// Split a `Site/Area/...` path into segments, dropping empty ones.
pub fn split_path(path: &str) -> Vec<String> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_path(segments: &[String]) -> String {
    segments.join(&PATH_SEPARATOR.to_string())
}

fn deserialize_path<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    Ok(split_path(&raw))
}

fn serialize_path<S>(segments: &[String], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&join_path(segments))
}

/// How the stored link lists are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkMode {
    /// Only the hovered module's own `linked_ids`.
    #[default]
    Directed,
    /// Also modules that list the hovered module, even when it does not list them.
    Symmetric,
}

impl LinkMode {
    pub fn from_param(v: &str) -> Option<LinkMode> {
        match v.trim().to_ascii_lowercase().as_str() {
            "directed" => Some(LinkMode::Directed),
            "symmetric" | "undirected" => Some(LinkMode::Symmetric),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    spine: PercentPoint,
    modules: Vec<ModuleRecord>,
}

/// Static catalog of modules plus the spine reference point.
#[derive(Clone, Debug)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRecord>,
    spine: PercentPoint,
    by_id: HashMap<String, usize>,
}

impl ModuleRegistry {
    pub fn new(modules: Vec<ModuleRecord>, spine: PercentPoint) -> Result<Self, CatalogError> {
        if !spine.is_valid() {
            return Err(CatalogError::InvalidSpine {
                x: spine.x,
                y: spine.y,
            });
        }
        let mut by_id = HashMap::new();
        for (i, m) in modules.iter().enumerate() {
            if !m.default_position.is_valid() {
                return Err(CatalogError::InvalidPosition {
                    id: m.id.clone(),
                    x: m.default_position.x,
                    y: m.default_position.y,
                });
            }
            if m.namespace_path.is_empty() {
                return Err(CatalogError::EmptyPath(m.id.clone()));
            }
            if by_id.insert(m.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(m.id.clone()));
            }
        }
        let registry = ModuleRegistry {
            modules,
            spine,
            by_id,
        };
        for m in &registry.modules {
            for link in &m.linked_ids {
                if !registry.contains(link) {
                    log::warn!("module `{}` links to unknown module `{}`", m.id, link);
                }
            }
        }
        Ok(registry)
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::new(file.modules, file.spine)
    }

    /// Catalog compiled into the crate.
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_CATALOG) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("embedded catalog rejected: {e}");
                ModuleRegistry {
                    modules: Vec::new(),
                    spine: PercentPoint::new(50.0, 50.0),
                    by_id: HashMap::new(),
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleRecord> {
        self.by_id.get(id).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn spine(&self) -> PercentPoint {
        self.spine
    }

    /// Linked records of `record` in link-list order, unresolved ids dropped.
    pub fn linked<'a>(&'a self, record: &ModuleRecord, mode: LinkMode) -> Vec<&'a ModuleRecord> {
        let mut out: Vec<&ModuleRecord> = Vec::new();
        for id in &record.linked_ids {
            if let Some(m) = self.get(id)
                && !out.iter().any(|o| o.id == m.id)
            {
                out.push(m);
            }
        }
        if mode == LinkMode::Symmetric {
            for m in &self.modules {
                if m.id != record.id
                    && m.linked_ids.iter().any(|l| *l == record.id)
                    && !out.iter().any(|o| o.id == m.id)
                {
                    out.push(m);
                }
            }
        }
        out
    }
}
