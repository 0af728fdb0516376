use std::cell::RefCell;
use std::rc::Rc;

use factory_core::anchors::MeasureTrigger;
use factory_core::drag::DragRelease;
use factory_core::geometry::{ContainerSize, PixelPoint};
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, Event, EventTarget, HtmlElement, HtmlInputElement, PageTransitionEvent, PointerEvent,
};

use crate::flicker;
use crate::measure::{self, schedule, schedule_all};
use crate::render;
use crate::state::{State, View};

fn on<E>(target: &EventTarget, name: &str, handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let cb = Closure::<dyn FnMut(E)>::wrap(Box::new(handler));
    target.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

/// Closest ancestor of the event target (inclusive) matching `selector`.
fn closest(e: &Event, selector: &str) -> Option<Element> {
    let target: Element = e.target()?.dyn_into().ok()?;
    target.closest(selector).ok().flatten()
}

fn pointer(e: &PointerEvent) -> PixelPoint {
    PixelPoint::new(e.client_x() as f64, e.client_y() as f64)
}

fn map_size(s: &State) -> ContainerSize {
    s.container(View::Map)
        .map(|m| {
            let r = m.get_bounding_client_rect();
            ContainerSize::new(r.width(), r.height())
        })
        .unwrap_or_default()
}

fn settle_release(s: &State, release: &DragRelease) {
    match release {
        DragRelease::Moved { id, .. } => {
            render::place_node(s, id);
            render::clear_drag_class(s, id);
        }
        DragRelease::Click { id } => {
            render::clear_drag_class(s, id);
            if let Err(e) = render::render_popup(s) {
                log::warn!("popup render failed: {e:?}");
            }
        }
    }
}

/// Full re-render after a language switch or catalog change.
pub fn rerender(state: &Rc<RefCell<State>>) {
    {
        let mut s = state.borrow_mut();
        if let Err(e) = render::render_all(&mut s) {
            log::error!("render failed: {e:?}");
        }
    }
    flicker::start(state);
    schedule_all(state, MeasureTrigger::Mounted);
}

fn set_hover(state: &Rc<RefCell<State>>, id: Option<String>) {
    let changed = {
        let mut s = state.borrow_mut();
        let changed = s.app.hover(id.as_deref());
        if changed {
            render::update_emphasis(&s);
        }
        changed
    };
    if changed {
        schedule_all(state, MeasureTrigger::HoverChanged);
    }
}

fn attach_header(state: &Rc<RefCell<State>>, header: &Element) -> Result<(), JsValue> {
    let st = state.clone();
    on(header, "click", move |e: Event| {
        let Some(btn) = closest(&e, "button") else {
            return;
        };
        match btn.id().as_str() {
            "langToggle" => {
                let lang = st.borrow_mut().app.toggle_language();
                log::info!("language switched to {}", lang.tag());
                rerender(&st);
            }
            "resetLayout" => {
                {
                    let mut s = st.borrow_mut();
                    s.app.reset_positions();
                    render::place_all_nodes(&s);
                }
                schedule(&st, View::Map, MeasureTrigger::Mounted);
            }
            _ => {}
        }
    })
}

fn attach_map(state: &Rc<RefCell<State>>, map: &Element) -> Result<(), JsValue> {
    let st = state.clone();
    on(map, "pointerdown", move |e: PointerEvent| {
        let Some(node) = closest(&e, ".map-node") else {
            return;
        };
        let Some(id) = node.get_attribute("data-id") else {
            return;
        };
        e.prevent_default();
        if st.borrow_mut().app.begin_drag(&id, pointer(&e)) {
            let _ = node.set_pointer_capture(e.pointer_id());
        }
    })?;

    let st = state.clone();
    on(map, "pointermove", move |e: PointerEvent| {
        let mut s = st.borrow_mut();
        let Some(offset) = s.app.drag_move(pointer(&e)) else {
            return;
        };
        if let Some(id) = s.app.drag().active_id().map(str::to_string) {
            render::offset_node(&s, &id, offset);
            measure::measure_now(&mut s, View::Map);
        }
    })?;

    let st = state.clone();
    on(map, "pointerup", move |e: PointerEvent| {
        let released = {
            let mut s = st.borrow_mut();
            let size = map_size(&s);
            let released = s.app.end_drag(size);
            if let Some(r) = &released {
                settle_release(&s, r);
            }
            released
        };
        if let Some(node) = closest(&e, ".map-node") {
            let _ = node.release_pointer_capture(e.pointer_id());
        }
        if matches!(released, Some(DragRelease::Moved { .. })) {
            schedule_all(&st, MeasureTrigger::Mounted);
        }
    })?;

    for name in ["lostpointercapture", "pointercancel"] {
        let st = state.clone();
        on(map, name, move |_e: PointerEvent| {
            let cancelled = {
                let mut s = st.borrow_mut();
                let size = map_size(&s);
                let released = s.app.cancel_drag(size);
                if let Some(r) = &released {
                    settle_release(&s, r);
                }
                released.is_some()
            };
            if cancelled {
                schedule_all(&st, MeasureTrigger::Mounted);
            }
        })?;
    }
    Ok(())
}

fn attach_hover(state: &Rc<RefCell<State>>, pane: &Element) -> Result<(), JsValue> {
    let st = state.clone();
    on(pane, "pointerover", move |e: PointerEvent| {
        let id = closest(&e, "[data-id]").and_then(|el| el.get_attribute("data-id"));
        set_hover(&st, id);
    })?;
    let st = state.clone();
    on(pane, "pointerleave", move |_e: PointerEvent| {
        set_hover(&st, None);
    })
}

fn attach_sidebar(state: &Rc<RefCell<State>>, content: &Element) -> Result<(), JsValue> {
    let st = state.clone();
    on(content, "click", move |e: Event| {
        let Some(id) = closest(&e, ".module-card").and_then(|c| c.get_attribute("data-id")) else {
            return;
        };
        let mut s = st.borrow_mut();
        if s.app.select(&id) {
            s.editing_link = false;
            if let Err(e) = render::render_popup(&s) {
                log::warn!("popup render failed: {e:?}");
            }
        }
    })
}

fn attach_popup(state: &Rc<RefCell<State>>, popup: &Element) -> Result<(), JsValue> {
    let st = state.clone();
    on(popup, "click", move |e: Event| {
        let mut s = st.borrow_mut();
        if let Some(id) = closest(&e, "[data-select]").and_then(|l| l.get_attribute("data-select")) {
            s.editing_link = false;
            s.app.select(&id);
        } else if let Some(action) = closest(&e, "[data-action]").and_then(|a| a.get_attribute("data-action")) {
            match action.as_str() {
                "close" => {
                    s.editing_link = false;
                    s.app.close_popup();
                }
                "open" => {
                    let target = s.app.selected().and_then(|id| s.app.link_for(id)).map(str::to_string);
                    if let Some(url) = target {
                        let _ = s.window.open_with_url_and_target(&url, "_blank");
                    }
                    return;
                }
                "configure" => s.editing_link = true,
                "cancel-link" => s.editing_link = false,
                "save-link" => {
                    let value = s
                        .document
                        .get_element_by_id("linkInput")
                        .and_then(|i| i.dyn_into::<HtmlInputElement>().ok())
                        .map(|i| i.value())
                        .unwrap_or_default();
                    if let Some(id) = s.app.selected().map(str::to_string) {
                        match s.app.save_link(&id, &value) {
                            Some(url) => log::info!("link for `{id}` set to {url}"),
                            None => log::debug!("blank link for `{id}` ignored"),
                        }
                    }
                    s.editing_link = false;
                }
                _ => return,
            }
        } else {
            return;
        }
        if let Err(e) = render::render_popup(&s) {
            log::warn!("popup render failed: {e:?}");
        }
        if s.editing_link
            && let Some(input) = s.document.get_element_by_id("linkInput")
            && let Ok(input) = input.dyn_into::<HtmlElement>()
        {
            let _ = input.focus();
        }
    })
}

fn attach_resizer(state: &Rc<RefCell<State>>, resizer: &Element) -> Result<(), JsValue> {
    let st = state.clone();
    on(resizer, "pointerdown", move |e: PointerEvent| {
        e.prevent_default();
        st.borrow_mut().resizing_sidebar = true;
    })?;

    let window = state.borrow().window.clone();
    let st = state.clone();
    on(&window, "pointermove", move |e: PointerEvent| {
        let resized = {
            let mut s = st.borrow_mut();
            if !s.resizing_sidebar {
                return;
            }
            let width = s.window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
            let resized = s.app.resize_sidebar(e.client_x() as f64, width);
            if resized {
                render::apply_sidebar_width(&s);
            }
            resized
        };
        if resized {
            schedule_all(&st, MeasureTrigger::Resized);
        }
    })?;

    let st = state.clone();
    on(&window, "pointerup", move |_e: PointerEvent| {
        if let Ok(mut s) = st.try_borrow_mut() {
            s.resizing_sidebar = false;
        }
    })
}

/// Wire every DOM listener. The closures are leaked and live as long as the page.
pub fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    let window = state.borrow().window.clone();
    let get = |id: &str| {
        doc.get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))
    };

    attach_header(&state, &get("header")?)?;
    let map = get("map")?;
    attach_map(&state, &map)?;
    attach_hover(&state, &map)?;
    let content = get("sidebarContent")?;
    attach_hover(&state, &content)?;
    attach_sidebar(&state, &content)?;
    attach_popup(&state, &get("popup")?)?;
    attach_resizer(&state, &get("resizer")?)?;

    let st = state.clone();
    on(&window, "resize", move |_e: Event| {
        schedule_all(&st, MeasureTrigger::Resized);
    })?;

    let st = state.clone();
    on(&window, "pagehide", move |_e: Event| {
        if let Ok(mut s) = st.try_borrow_mut() {
            s.teardown();
        }
    })?;

    // a page restored from the back/forward cache kept its DOM but not its timers
    let st = state.clone();
    on(&window, "pageshow", move |e: PageTransitionEvent| {
        if e.persisted() {
            log::debug!("page restored; restarting timers");
            flicker::start(&st);
            schedule_all(&st, MeasureTrigger::Mounted);
        }
    })?;
    Ok(())
}
