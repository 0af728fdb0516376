use std::cell::RefCell;
use std::rc::Rc;

use factory_core::anchors::AnchorLocator;
use factory_core::telemetry::{TagFlicker, TaskSlot};
use factory_core::AppState;
use gloo_timers::callback::{Interval, Timeout};
use web_sys::{Document, Element, Window};

use crate::storage::WebStorage;

/// The two panes that draw connection lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Map,
    Sidebar,
}

/// Everything the DOM callbacks share, behind one `Rc<RefCell<_>>`.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub app: AppState<WebStorage>,
    pub map_anchors: AnchorLocator<Element>,
    pub sidebar_anchors: AnchorLocator<Element>,
    pub map_pending: Vec<Timeout>,
    pub sidebar_pending: Vec<Timeout>,
    pub flicker: TagFlicker,
    pub flicker_task: TaskSlot<Interval>,
    /// Clears the earliest running flash when it ends.
    pub flash_expiry: Option<Timeout>,
    /// Popup shows the URL editor instead of the detail view.
    pub editing_link: bool,
    pub resizing_sidebar: bool,
}

impl State {
    pub fn container(&self, view: View) -> Option<Element> {
        let id = match view {
            View::Map => "map",
            View::Sidebar => "sidebarContent",
        };
        self.document.get_element_by_id(id)
    }

    pub fn anchors_mut(&mut self, view: View) -> &mut AnchorLocator<Element> {
        match view {
            View::Map => &mut self.map_anchors,
            View::Sidebar => &mut self.sidebar_anchors,
        }
    }

    pub fn anchors(&self, view: View) -> &AnchorLocator<Element> {
        match view {
            View::Map => &self.map_anchors,
            View::Sidebar => &self.sidebar_anchors,
        }
    }

    pub fn pending_mut(&mut self, view: View) -> &mut Vec<Timeout> {
        match view {
            View::Map => &mut self.map_pending,
            View::Sidebar => &mut self.sidebar_pending,
        }
    }

    /// Cancel every timer this state owns.
    pub fn teardown(&mut self) {
        self.map_pending.clear();
        self.sidebar_pending.clear();
        self.flicker_task.stop();
        self.flash_expiry = None;
    }
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
