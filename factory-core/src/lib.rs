//! Model of the UNS factory map: module catalog, persisted layout, namespace
//! tree, measured anchors, connection lines and node dragging.
//!
//! Nothing in here touches a browser. Geometry comes in through
//! [`anchors::MeasureProvider`] and persistence through
//! [`storage::KeyValueStore`].

pub mod anchors;
pub mod app;
pub mod connections;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod i18n;
pub mod layout;
pub mod namespace;
pub mod popup;
pub mod positions;
pub mod registry;
pub mod storage;
pub mod telemetry;

pub use anchors::{AnchorKey, AnchorLocator, AnchorMap, MeasureProvider, MeasureTrigger};
pub use app::{AppConfig, AppState};
pub use connections::{ConnectionMode, ConnectionResolver, Emphasis, Segment};
pub use drag::{DragController, DragRelease};
pub use error::{CatalogError, StoreError};
pub use geometry::{ContainerSize, PercentPoint, PixelPoint, Rect};
pub use i18n::{Language, Translations};
pub use registry::{LinkMode, ModuleRecord, ModuleRegistry};
pub use storage::{KeyValueStore, MemoryStore};
pub use telemetry::{TagFlicker, TaskSlot};
