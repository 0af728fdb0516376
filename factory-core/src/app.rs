//! Application state and the named operations that mutate it.
//!
//! The browser runtime owns exactly one [`AppState`] and routes every input
//! event through these methods, then re-renders from the queries.

use crate::anchors::AnchorMap;
use crate::connections::{ConnectionMode, ConnectionResolver, Emphasis, Segment};
use crate::drag::{DragController, DragRelease};
use crate::geometry::{ContainerSize, PercentPoint, PixelPoint};
use crate::i18n::{Language, Translations};
use crate::layout::SidebarLayout;
use crate::namespace::{NamespaceTree, is_highlighted};
use crate::popup::PopupView;
use crate::positions::{PositionMap, PositionStore};
use crate::registry::{LinkMode, ModuleRecord, ModuleRegistry};
use crate::storage::{KeyValueStore, ModuleLinks};

/// Start-up options, usually taken from URL query parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub link_mode: LinkMode,
    /// Takes precedence over the persisted preference; not written back.
    pub language: Option<Language>,
}

pub struct AppState<S: KeyValueStore> {
    registry: ModuleRegistry,
    translations: Translations,
    store: S,
    positions: PositionStore,
    links: ModuleLinks,
    language: Language,
    hovered: Option<String>,
    selected: Option<String>,
    drag: DragController,
    resolver: ConnectionResolver,
    sidebar: SidebarLayout,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(registry: ModuleRegistry, translations: Translations, store: S, config: AppConfig) -> Self {
        let positions = PositionStore::restore(&registry, &store);
        let links = ModuleLinks::load(&store);
        let language = config.language.unwrap_or_else(|| Language::load(&store));
        log::info!(
            "loaded {} modules, language {}, {:?} links",
            registry.len(),
            language.tag(),
            config.link_mode
        );
        AppState {
            registry,
            translations,
            store,
            positions,
            links,
            language,
            hovered: None,
            selected: None,
            drag: DragController::new(),
            resolver: ConnectionResolver::new(config.link_mode),
            sidebar: SidebarLayout::default(),
        }
    }

    /// Set or clear the hovered module. Ignored while a drag is active and for
    /// unknown ids. Returns whether the hovered id changed.
    pub fn hover(&mut self, id: Option<&str>) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        let next = id.filter(|id| self.registry.contains(id)).map(str::to_string);
        if next == self.hovered {
            return false;
        }
        self.hovered = next;
        true
    }

    /// Open the popup for `id`.
    pub fn select(&mut self, id: &str) -> bool {
        if self.drag.is_dragging() || !self.registry.contains(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn close_popup(&mut self) {
        self.selected = None;
    }

    pub fn toggle_language(&mut self) -> Language {
        self.set_language(self.language.toggled());
        self.language
    }

    pub fn set_language(&mut self, lang: Language) {
        self.language = lang;
        lang.save(&mut self.store);
    }

    /// Press on a map node. Starts from the node's committed position.
    pub fn begin_drag(&mut self, id: &str, pointer: PixelPoint) -> bool {
        let Some(origin) = self.positions.get(id) else {
            return false;
        };
        self.drag.pointer_down(id, origin, pointer)
    }

    pub fn drag_move(&mut self, pointer: PixelPoint) -> Option<PixelPoint> {
        self.drag.pointer_move(pointer)
    }

    /// Release. A drag commits the new position; a motionless press selects the node.
    pub fn end_drag(&mut self, container: ContainerSize) -> Option<DragRelease> {
        let release = self.drag.pointer_up(container)?;
        match &release {
            DragRelease::Moved { id, position } => {
                self.positions.commit(id, *position, &mut self.store);
            }
            DragRelease::Click { id } => {
                self.select(id);
            }
        }
        Some(release)
    }

    /// Pointer capture lost: commit with the last known offset.
    pub fn cancel_drag(&mut self, container: ContainerSize) -> Option<DragRelease> {
        let release = self.drag.cancel(container)?;
        if let DragRelease::Moved { id, position } = &release {
            self.positions.commit(id, *position, &mut self.store);
        }
        Some(release)
    }

    /// Store the external link of `id`. Blank input and unknown ids are ignored.
    pub fn save_link(&mut self, id: &str, url: &str) -> Option<String> {
        if !self.registry.contains(id) {
            log::warn!("ignoring link for unknown module `{id}`");
            return None;
        }
        self.links.save(id, url, &mut self.store)
    }

    pub fn reset_positions(&mut self) {
        self.positions.reset(&self.registry, &mut self.store);
    }

    pub fn resize_sidebar(&mut self, pointer_x: f64, page_width: f64) -> bool {
        self.sidebar.resize(pointer_x, page_width)
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Translate `key` in the current language.
    pub fn t(&self, key: &str) -> String {
        self.translations.translate(self.language, key, &[])
    }

    pub fn module_name(&self, record: &ModuleRecord) -> String {
        self.translations.module_name(self.language, record)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn hovered_record(&self) -> Option<&ModuleRecord> {
        self.hovered.as_deref().and_then(|id| self.registry.get(id))
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn position(&self, id: &str) -> Option<PercentPoint> {
        self.positions.get(id)
    }

    pub fn positions(&self) -> &PositionMap {
        self.positions.positions()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn sidebar(&self) -> &SidebarLayout {
        &self.sidebar
    }

    pub fn link_mode(&self) -> LinkMode {
        self.resolver.link_mode
    }

    pub fn namespace_tree(&self) -> NamespaceTree<'_> {
        NamespaceTree::build(self.registry.iter(), |seg| {
            self.translations.segment_label(self.language, seg)
        })
    }

    pub fn is_path_highlighted(&self, path: &str) -> bool {
        is_highlighted(path, self.hovered_record())
    }

    pub fn connections(&self, anchors: &AnchorMap, mode: ConnectionMode) -> Vec<Segment> {
        self.resolver
            .resolve(self.hovered.as_deref(), &self.registry, anchors, mode)
    }

    pub fn emphasis(&self, id: &str) -> Emphasis {
        self.resolver
            .emphasis(id, self.hovered.as_deref(), &self.registry)
    }

    pub fn popup(&self) -> Option<PopupView> {
        let record = self.registry.get(self.selected.as_deref()?)?;
        Some(PopupView::build(
            record,
            &self.registry,
            &self.translations,
            self.language,
            &self.links,
            self.resolver.link_mode,
        ))
    }

    pub fn link_for(&self, id: &str) -> Option<&str> {
        self.links.get(id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LANGUAGE_KEY, MemoryStore, POSITIONS_KEY};

    const SIZE: ContainerSize = ContainerSize::new(800.0, 400.0);

    fn app(store: MemoryStore) -> AppState<MemoryStore> {
        AppState::new(
            ModuleRegistry::builtin(),
            Translations::builtin(),
            store,
            AppConfig::default(),
        )
    }

    #[test]
    fn hover_is_suppressed_while_dragging() {
        let mut a = app(MemoryStore::new());
        assert!(a.hover(Some("mes_01")));
        assert!(!a.hover(Some("mes_01")));
        assert!(a.begin_drag("wms_02", PixelPoint::new(0.0, 0.0)));
        assert!(!a.hover(Some("lims_03")));
        assert_eq!(a.hovered(), Some("mes_01"));
        a.end_drag(SIZE);
        assert!(a.hover(None));
    }

    #[test]
    fn unknown_hover_clears() {
        let mut a = app(MemoryStore::new());
        a.hover(Some("mes_01"));
        assert!(a.hover(Some("nope")));
        assert_eq!(a.hovered(), None);
    }

    #[test]
    fn click_without_motion_opens_popup() {
        let mut a = app(MemoryStore::new());
        a.begin_drag("sct_04", PixelPoint::new(10.0, 10.0));
        assert_eq!(
            a.end_drag(SIZE),
            Some(DragRelease::Click { id: "sct_04".into() })
        );
        assert_eq!(a.selected(), Some("sct_04"));
        assert_eq!(a.popup().map(|p| p.id), Some("sct_04".to_string()));
        a.close_popup();
        assert!(a.popup().is_none());
    }

    #[test]
    fn drag_commits_and_persists() {
        let mut a = app(MemoryStore::new());
        a.begin_drag("mes_01", PixelPoint::new(100.0, 100.0));
        a.drag_move(PixelPoint::new(180.0, 60.0));
        a.end_drag(SIZE);
        assert_eq!(a.position("mes_01"), Some(PercentPoint::new(60.0, 40.0)));
        assert!(a.selected().is_none());
        let saved = a.store().get(POSITIONS_KEY).unwrap();
        let b = app(MemoryStore::new().with_entry(POSITIONS_KEY, &saved));
        assert_eq!(b.position("mes_01"), Some(PercentPoint::new(60.0, 40.0)));
    }

    #[test]
    fn cancelled_drag_still_commits() {
        let mut a = app(MemoryStore::new());
        a.begin_drag("wms_02", PixelPoint::new(0.0, 0.0));
        a.drag_move(PixelPoint::new(-80.0, 0.0));
        a.cancel_drag(SIZE);
        assert!(!a.drag().is_dragging());
        assert_eq!(a.position("wms_02"), Some(PercentPoint::new(65.0, 75.0)));
    }

    #[test]
    fn language_override_and_toggle() {
        let store = MemoryStore::new().with_entry(LANGUAGE_KEY, "en");
        let mut a = AppState::new(
            ModuleRegistry::builtin(),
            Translations::builtin(),
            store,
            AppConfig {
                language: Some(Language::Zh),
                ..AppConfig::default()
            },
        );
        assert_eq!(a.language(), Language::Zh);
        assert_eq!(a.store().get(LANGUAGE_KEY).as_deref(), Some("en"));
        assert_eq!(a.toggle_language(), Language::En);
        a.set_language(Language::Zh);
        assert_eq!(a.store().get(LANGUAGE_KEY).as_deref(), Some("zh"));
        assert_eq!(a.t("openSystem"), a.translations().translate(Language::Zh, "openSystem", &[]));
    }

    #[test]
    fn links_only_for_known_modules() {
        let mut a = app(MemoryStore::new());
        assert_eq!(a.save_link("ghost", "x.y"), None);
        assert_eq!(a.save_link("mes_01", "  "), None);
        assert_eq!(a.save_link("mes_01", "mes.local").as_deref(), Some("https://mes.local"));
        assert_eq!(a.link_for("mes_01"), Some("https://mes.local"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut a = app(MemoryStore::new());
        a.begin_drag("mes_01", PixelPoint::new(0.0, 0.0));
        a.drag_move(PixelPoint::new(100.0, 100.0));
        a.end_drag(SIZE);
        a.reset_positions();
        assert_eq!(a.position("mes_01"), Some(PercentPoint::new(50.0, 50.0)));
        assert_eq!(a.store().get(POSITIONS_KEY), None);
    }

    #[test]
    fn tree_labels_follow_language() {
        let mut a = app(MemoryStore::new());
        assert_eq!(a.namespace_tree().roots[0].label, "Site");
        a.set_language(Language::Zh);
        assert_eq!(a.namespace_tree().roots[0].label, "站点");
        a.hover(Some("wms_02"));
        assert!(a.is_path_highlighted("Site/Area/Warehouse"));
        assert!(!a.is_path_highlighted("Site/Area/Production"));
        assert_eq!(a.emphasis("wms_02"), Emphasis::Hovered);
        assert_eq!(a.emphasis("mes_01"), Emphasis::Linked);
        assert_eq!(a.emphasis("lims_03"), Emphasis::Plain);
    }
}
