use factory_core::anchors::AnchorKey;
use factory_core::connections::{ConnectionMode, Emphasis};
use factory_core::geometry::{PercentPoint, PixelPoint};
use factory_core::i18n::Language;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::state::{State, View};
use crate::utils::{asset_url, now_ms};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn el(doc: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let e = doc.create_element(tag)?;
    if !class.is_empty() {
        e.set_class_name(class);
    }
    Ok(e)
}

fn text_el(doc: &Document, tag: &str, class: &str, text: &str) -> Result<Element, JsValue> {
    let e = el(doc, tag, class)?;
    e.set_text_content(Some(text));
    Ok(e)
}

/// Create a text element and append it to `parent`.
fn append_text(
    parent: &Element,
    doc: &Document,
    tag: &str,
    class: &str,
    text: &str,
) -> Result<Element, JsValue> {
    let e = text_el(doc, tag, class, text)?;
    parent.append_child(&e)?;
    Ok(e)
}

fn set_style(e: &Element, prop: &str, value: &str) {
    if let Some(h) = e.dyn_ref::<HtmlElement>() {
        let _ = h.style().set_property(prop, value);
    }
}

fn toggle(e: &Element, class: &str, on: bool) {
    let _ = e.class_list().toggle_with_force(class, on);
}

fn mount(doc: &Document, id: &str) -> Result<Element, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))
}

fn lines_id(view: View) -> &'static str {
    match view {
        View::Map => "mapLines",
        View::Sidebar => "sidebarLines",
    }
}

pub fn map_node_id(id: &str) -> String {
    format!("node-{id}")
}

fn card_id(id: &str) -> String {
    format!("card-{id}")
}

fn tree_node_id(path: &str) -> String {
    format!("tree-{path}")
}

pub fn render_all(state: &mut State) -> Result<(), JsValue> {
    render_header(state)?;
    render_map(state)?;
    render_sidebar(state)?;
    apply_sidebar_width(state);
    render_popup(state)
}

pub fn render_header(state: &State) -> Result<(), JsValue> {
    let doc = &state.document;
    let header = mount(doc, "header")?;
    header.set_inner_html("");
    let app = &state.app;
    append_text(&header, doc, "h1", "title", &app.t("title"))?;
    append_text(&header, doc, "span", "status", &app.t("dataExchangeActive"))?;

    let reset = text_el(doc, "button", "btn", &app.t("resetLayout"))?;
    reset.set_id("resetLayout");
    header.append_child(&reset)?;

    let other = match app.language() {
        Language::En => app.t("chinese"),
        Language::Zh => app.t("english"),
    };
    let lang = text_el(doc, "button", "btn", &other)?;
    lang.set_id("langToggle");
    lang.set_attribute("title", &app.t("language"))?;
    header.append_child(&lang)?;

    doc.set_title(&app.t("title"));
    Ok(())
}

/// Rebuild the map pane: one absolutely placed node per module plus the spine.
pub fn render_map(state: &mut State) -> Result<(), JsValue> {
    let doc = state.document.clone();
    let map = mount(&doc, "map")?;
    map.set_inner_html("");

    let lines = doc.create_element_ns(Some(SVG_NS), "svg")?;
    lines.set_id(lines_id(View::Map));
    lines.set_attribute("class", "lines")?;
    map.append_child(&lines)?;

    let spine_at = state.app.registry().spine();
    let spine = text_el(&doc, "div", "spine", "UNS")?;
    place(&spine, spine_at);
    map.append_child(&spine)?;

    state.map_anchors.clear();
    state.map_anchors.pin(AnchorKey::Spine, spine_at);
    for m in state.app.registry().iter() {
        let node = el(&doc, "div", "map-node")?;
        node.set_id(&map_node_id(&m.id));
        node.set_attribute("data-id", &m.id)?;
        if let Some(img) = &m.image_ref {
            let icon = el(&doc, "img", "node-icon")?;
            icon.set_attribute("src", &asset_url(img))?;
            icon.set_attribute("draggable", "false")?;
            node.append_child(&icon)?;
        }
        append_text(&node, &doc, "span", "node-label", &state.app.module_name(m))?;
        if let Some(p) = state.app.position(&m.id) {
            place(&node, p);
        }
        map.append_child(&node)?;
        state.map_anchors.register(AnchorKey::module(&m.id), node);
    }
    update_emphasis(state);
    Ok(())
}

/// Rebuild the namespace tree with module cards and their tag rows.
pub fn render_sidebar(state: &mut State) -> Result<(), JsValue> {
    let doc = state.document.clone();
    let content = mount(&doc, "sidebarContent")?;
    content.set_inner_html("");
    append_text(&content, &doc, "h2", "sidebar-title", &state.app.t("sidebarTitle"))?;

    let lines = doc.create_element_ns(Some(SVG_NS), "svg")?;
    lines.set_id(lines_id(View::Sidebar));
    lines.set_attribute("class", "lines")?;
    content.append_child(&lines)?;

    state.sidebar_anchors.clear();
    let app = &state.app;
    let anchors = &mut state.sidebar_anchors;
    let tree = app.namespace_tree();
    let head = [app.t("type"), app.t("value"), app.t("protocol")];
    for node in tree.walk() {
        let row = text_el(&doc, "div", "tree-node", &node.label)?;
        row.set_id(&tree_node_id(&node.full_path));
        set_style(&row, "padding-left", &format!("{}px", node.depth * 14));
        content.append_child(&row)?;

        for m in &node.modules {
            let card = el(&doc, "div", "module-card")?;
            card.set_id(&card_id(&m.id));
            card.set_attribute("data-id", &m.id)?;
            set_style(&card, "margin-left", &format!("{}px", (node.depth + 1) * 14));
            append_text(&card, &doc, "div", "card-title", &app.module_name(m))?;
            if !m.tags.is_empty() {
                append_text(&card, &doc, "div", "card-subtitle", &app.t("unsTelemetry"))?;
            }
            for tag in &m.tags {
                let tr = el(&doc, "div", "tag-row")?;
                append_text(&tr, &doc, "span", "tag-name", &tag.name)?;
                let ty = text_el(&doc, "span", "tag-type", &tag.type_)?;
                ty.set_attribute("title", &head[0])?;
                tr.append_child(&ty)?;
                let val = text_el(&doc, "span", "tag-value", &tag.value)?;
                val.set_attribute("title", &head[1])?;
                tr.append_child(&val)?;
                let proto = text_el(&doc, "span", "tag-protocol", &tag.protocol)?;
                proto.set_attribute("title", &head[2])?;
                tr.append_child(&proto)?;
                card.append_child(&tr)?;
                anchors.register(AnchorKey::tag(&m.id, &tag.name), tr);
            }
            content.append_child(&card)?;
            anchors.register(AnchorKey::module(&m.id), card);
        }
    }
    update_emphasis(state);
    update_tag_values(state);
    Ok(())
}

fn place(e: &Element, p: PercentPoint) {
    set_style(e, "left", &format!("{}%", p.x));
    set_style(e, "top", &format!("{}%", p.y));
    set_style(e, "transform", "translate(-50%, -50%)");
}

/// Move a node to its committed position, dropping any live drag offset.
pub fn place_node(state: &State, id: &str) {
    if let (Some(node), Some(p)) = (
        state.document.get_element_by_id(&map_node_id(id)),
        state.app.position(id),
    ) {
        place(&node, p);
    }
}

pub fn place_all_nodes(state: &State) {
    for m in state.app.registry().iter() {
        place_node(state, &m.id);
    }
}

/// Live transform while dragging; the committed position is untouched.
pub fn offset_node(state: &State, id: &str, offset: PixelPoint) {
    if let Some(node) = state.document.get_element_by_id(&map_node_id(id)) {
        set_style(
            &node,
            "transform",
            &format!(
                "translate(calc(-50% + {}px), calc(-50% + {}px))",
                offset.x, offset.y
            ),
        );
        toggle(&node, "dragging", true);
    }
}

pub fn clear_drag_class(state: &State, id: &str) {
    if let Some(node) = state.document.get_element_by_id(&map_node_id(id)) {
        toggle(&node, "dragging", false);
    }
}

/// Restyle nodes, cards and tree rows for the current hover without rebuilding.
pub fn update_emphasis(state: &State) {
    let doc = &state.document;
    let app = &state.app;
    for m in app.registry().iter() {
        let emphasis = app.emphasis(&m.id);
        for id in [map_node_id(&m.id), card_id(&m.id)] {
            if let Some(e) = doc.get_element_by_id(&id) {
                toggle(&e, "hovered", emphasis == Emphasis::Hovered);
                toggle(&e, "linked", emphasis == Emphasis::Linked);
                toggle(&e, "dimmed", emphasis == Emphasis::Plain && app.hovered().is_some());
            }
        }
    }
    for node in app.namespace_tree().walk() {
        if let Some(e) = doc.get_element_by_id(&tree_node_id(&node.full_path)) {
            toggle(&e, "highlighted", app.is_path_highlighted(&node.full_path));
        }
    }
}

/// Push flicker values into the tag rows registered by the last sidebar build.
pub fn update_tag_values(state: &State) {
    let now = now_ms();
    for m in state.app.registry().iter() {
        for tag in &m.tags {
            let Some(row) = state.sidebar_anchors.handle(&AnchorKey::tag(&m.id, &tag.name)) else {
                continue;
            };
            toggle(row, "flash", state.flicker.is_flashing(&m.id, &tag.name, now));
            if let Ok(Some(val)) = row.query_selector(".tag-value") {
                val.set_text_content(Some(state.flicker.display_value(&m.id, tag, now)));
            }
        }
    }
}

/// Redraw the connection overlay of `view` from its last measurement.
pub fn render_lines(state: &State, view: View) {
    let doc = &state.document;
    let Some(svg) = doc.get_element_by_id(lines_id(view)) else {
        return;
    };
    svg.set_inner_html("");
    if view == View::Sidebar
        && let Some(content) = state.container(view)
    {
        let _ = svg.set_attribute("height", &content.scroll_height().to_string());
    }
    let mode = match view {
        View::Map => ConnectionMode::Spine,
        View::Sidebar => ConnectionMode::TagPairing,
    };
    for seg in state.app.connections(state.anchors(view).anchors(), mode) {
        let Ok(line) = doc.create_element_ns(Some(SVG_NS), "line") else {
            continue;
        };
        let attrs = [
            ("x1", seg.start.x.to_string()),
            ("y1", seg.start.y.to_string()),
            ("x2", seg.end.x.to_string()),
            ("y2", seg.end.y.to_string()),
            ("class", "link-line".to_string()),
            ("style", format!("animation-delay: {}ms", seg.delay_ms)),
        ];
        for (k, v) in attrs {
            let _ = line.set_attribute(k, &v);
        }
        let _ = svg.append_child(&line);
    }
}

pub fn apply_sidebar_width(state: &State) {
    let layout = state.app.sidebar();
    if let Some(sidebar) = state.document.get_element_by_id("sidebar") {
        set_style(&sidebar, "width", &format!("{}%", layout.width_percent()));
    }
    if let Some(map) = state.document.get_element_by_id("mapPane") {
        set_style(&map, "width", &format!("{}%", layout.map_percent()));
    }
}

/// Detail popup for the selected module, or nothing.
pub fn render_popup(state: &State) -> Result<(), JsValue> {
    let doc = &state.document;
    let root = mount(doc, "popup")?;
    root.set_inner_html("");
    let Some(view) = state.app.popup() else {
        toggle(&root, "open", false);
        return Ok(());
    };
    toggle(&root, "open", true);
    let app = &state.app;

    let backdrop = el(doc, "div", "popup-backdrop")?;
    backdrop.set_attribute("data-action", "close")?;
    root.append_child(&backdrop)?;

    let card = el(doc, "div", "popup-card")?;
    card.set_attribute("data-id", &view.id)?;
    let close = text_el(doc, "button", "popup-close", "×")?;
    close.set_attribute("data-action", "close")?;
    card.append_child(&close)?;
    append_text(&card, doc, "h2", "", &view.name)?;
    append_text(&card, doc, "div", "popup-path", &view.path)?;
    append_text(&card, doc, "p", "popup-description", &view.description)?;

    if !view.metrics.is_empty() {
        let dl = el(doc, "dl", "popup-metrics")?;
        for (label, value) in &view.metrics {
            append_text(&dl, doc, "dt", "", label)?;
            append_text(&dl, doc, "dd", "", value)?;
        }
        card.append_child(&dl)?;
    }

    if !view.features.is_empty() {
        let ul = el(doc, "ul", "popup-features")?;
        for f in &view.features {
            append_text(&ul, doc, "li", "", &format!("{} {}", f.icon, f.text))?;
        }
        card.append_child(&ul)?;
    }

    if !view.tags.is_empty() {
        append_text(&card, doc, "h3", "", &app.t("tags"))?;
        let ul = el(doc, "ul", "popup-tags")?;
        for t in &view.tags {
            let value = state.flicker.display_value(&view.id, t, now_ms());
            let line = format!("{} · {} · {} · {}", t.name, t.type_, value, t.protocol);
            append_text(&ul, doc, "li", "", &line)?;
        }
        card.append_child(&ul)?;
    }

    if !view.linked.is_empty() {
        append_text(&card, doc, "h3", "", &app.t("linkedModules"))?;
        let ul = el(doc, "ul", "popup-linked")?;
        for l in &view.linked {
            let li = text_el(doc, "li", "linked-module", &l.name)?;
            li.set_attribute("data-select", &l.id)?;
            ul.append_child(&li)?;
        }
        card.append_child(&ul)?;
    }

    let actions = el(doc, "div", "popup-actions")?;
    if state.editing_link {
        let input = el(doc, "input", "link-input")?;
        input.set_id("linkInput");
        input.set_attribute("type", "url")?;
        input.set_attribute("placeholder", &app.t("enterUrl"))?;
        input.set_attribute("value", view.link.as_deref().unwrap_or(""))?;
        actions.append_child(&input)?;
        let save = text_el(doc, "button", "btn primary", &app.t("save"))?;
        save.set_attribute("data-action", "save-link")?;
        actions.append_child(&save)?;
        let cancel = text_el(doc, "button", "btn", &app.t("cancel"))?;
        cancel.set_attribute("data-action", "cancel-link")?;
        actions.append_child(&cancel)?;
    } else {
        let open = text_el(doc, "button", "btn primary", &app.t("openSystem"))?;
        open.set_attribute("data-action", "open")?;
        if view.open_target().is_none() {
            open.set_attribute("disabled", "")?;
        }
        actions.append_child(&open)?;
        let configure = text_el(doc, "button", "btn", &app.t("configureLink"))?;
        configure.set_attribute("data-action", "configure")?;
        actions.append_child(&configure)?;
    }
    card.append_child(&actions)?;
    root.append_child(&card)?;
    Ok(())
}
