use std::cell::RefCell;
use std::rc::{Rc, Weak};

use factory_core::anchors::{MeasureProvider, MeasureTrigger};
use factory_core::geometry::Rect;
use gloo_timers::callback::Timeout;
use web_sys::Element;

use crate::render;
use crate::state::{State, View};

/// Reads geometry straight from the DOM, relative to one container element.
pub struct DomMeasure<'a> {
    container: &'a Element,
}

impl<'a> DomMeasure<'a> {
    pub fn new(container: &'a Element) -> Self {
        DomMeasure { container }
    }
}

fn rect_of(el: &Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

impl MeasureProvider for DomMeasure<'_> {
    type Handle = Element;

    fn container(&self) -> Option<Rect> {
        self.container.is_connected().then(|| rect_of(self.container))
    }

    fn measure(&self, handle: &Element) -> Option<Rect> {
        handle.is_connected().then(|| rect_of(handle))
    }
}

/// Re-measure `view` now and redraw its lines.
pub fn measure_now(state: &mut State, view: View) {
    let Some(container) = state.container(view) else {
        return;
    };
    let provider = DomMeasure::new(&container);
    state.anchors_mut(view).measure_all(&provider);
    render::render_lines(state, view);
}

/// Replace the pending measurement schedule of `view` with the one for `trigger`.
pub fn schedule(state: &Rc<RefCell<State>>, view: View, trigger: MeasureTrigger) {
    let weak: Weak<RefCell<State>> = Rc::downgrade(state);
    let timers: Vec<Timeout> = trigger
        .delays_ms()
        .iter()
        .map(|&ms| {
            let weak = weak.clone();
            Timeout::new(ms, move || {
                if let Some(st) = weak.upgrade()
                    && let Ok(mut s) = st.try_borrow_mut()
                {
                    measure_now(&mut s, view);
                }
            })
        })
        .collect();
    // dropping the previous vector cancels whatever had not fired yet
    *state.borrow_mut().pending_mut(view) = timers;
}

/// Hover changes affect both views.
pub fn schedule_all(state: &Rc<RefCell<State>>, trigger: MeasureTrigger) {
    schedule(state, View::Map, trigger);
    schedule(state, View::Sidebar, trigger);
}
