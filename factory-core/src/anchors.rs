//! Measured on-screen center points of rendered elements.

use std::collections::HashMap;
use std::fmt;

use crate::geometry::{PercentPoint, PixelPoint, Rect};

/// Separator of the composite `moduleId-tagName` key.
pub const TAG_KEY_SEPARATOR: char = '-';

/// Delays (ms) at which geometry is re-read after hover changes and mounts.
pub const SETTLE_DELAYS_MS: [u32; 5] = [0, 50, 150, 300, 600];
/// Resize only needs the immediate read; layout is already final.
pub const RESIZE_DELAYS_MS: [u32; 1] = [0];

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnchorKey {
    Module(String),
    Tag { module: String, tag: String },
    Spine,
}

impl AnchorKey {
    pub fn module(id: &str) -> Self {
        AnchorKey::Module(id.to_string())
    }

    pub fn tag(module: &str, tag: &str) -> Self {
        AnchorKey::Tag {
            module: module.to_string(),
            tag: tag.to_string(),
        }
    }
}

impl fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorKey::Module(id) => f.write_str(id),
            AnchorKey::Tag { module, tag } => write!(f, "{module}{TAG_KEY_SEPARATOR}{tag}"),
            AnchorKey::Spine => f.write_str("spine"),
        }
    }
}

/// What can have changed the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureTrigger {
    HoverChanged,
    Mounted,
    Resized,
}

impl MeasureTrigger {
    pub fn delays_ms(self) -> &'static [u32] {
        match self {
            MeasureTrigger::HoverChanged | MeasureTrigger::Mounted => &SETTLE_DELAYS_MS,
            MeasureTrigger::Resized => &RESIZE_DELAYS_MS,
        }
    }
}

/// Reads element geometry from whatever renders the view.
pub trait MeasureProvider {
    type Handle;

    /// Bounding rectangle of the shared container, `None` when it is not laid out.
    fn container(&self) -> Option<Rect>;

    /// Bounding rectangle of `handle`, `None` when it is no longer mounted.
    fn measure(&self, handle: &Self::Handle) -> Option<Rect>;
}

pub type AnchorMap = HashMap<AnchorKey, PixelPoint>;

/// Keyed registry of measurable elements plus the last measurement.
pub struct AnchorLocator<H> {
    handles: HashMap<AnchorKey, H>,
    pinned: HashMap<AnchorKey, PercentPoint>,
    anchors: AnchorMap,
}

impl<H> Default for AnchorLocator<H> {
    fn default() -> Self {
        AnchorLocator {
            handles: HashMap::new(),
            pinned: HashMap::new(),
            anchors: AnchorMap::new(),
        }
    }
}

impl<H> AnchorLocator<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `handle` with `key`, replacing any previous element.
    pub fn register(&mut self, key: AnchorKey, handle: H) {
        self.handles.insert(key, handle);
    }

    pub fn unregister(&mut self, key: &AnchorKey) -> Option<H> {
        self.handles.remove(key)
    }

    /// Drop every registered element, e.g. before a view is rebuilt.
    pub fn clear(&mut self) {
        self.handles.clear();
        self.anchors.clear();
    }

    /// A point fixed in percent space, resolved against the container on every measurement.
    pub fn pin(&mut self, key: AnchorKey, at: PercentPoint) {
        self.pinned.insert(key, at);
    }

    /// Element registered under `key`. Keys are structured, so distinct
    /// module/tag pairs never alias even when their display forms match.
    pub fn handle(&self, key: &AnchorKey) -> Option<&H> {
        self.handles.get(key)
    }

    pub fn registered(&self) -> usize {
        self.handles.len()
    }

    /// Result of the most recent [`measure_all`](Self::measure_all).
    pub fn anchors(&self) -> &AnchorMap {
        &self.anchors
    }

    /// Re-read every registered element. Elements the provider reports as
    /// unmounted are absent from the result rather than kept from before.
    pub fn measure_all<P>(&mut self, provider: &P) -> &AnchorMap
    where
        P: MeasureProvider<Handle = H>,
    {
        let mut next = AnchorMap::with_capacity(self.handles.len() + self.pinned.len());
        if let Some(container) = provider.container() {
            for (key, handle) in &self.handles {
                if let Some(rect) = provider.measure(handle) {
                    next.insert(key.clone(), rect.center_within(&container));
                }
            }
            let size = container.size();
            if size.is_measurable() {
                for (key, at) in &self.pinned {
                    next.insert(key.clone(), size.to_pixels(*at));
                }
            }
        }
        log::debug!(
            "measured {} of {} anchors",
            next.len(),
            self.handles.len() + self.pinned.len()
        );
        self.anchors = next;
        &self.anchors
    }
}
