use std::cell::RefCell;
use std::rc::Rc;

use factory_core::anchors::{AnchorLocator, MeasureTrigger};
use factory_core::telemetry::{TagFlicker, TaskSlot};
use factory_core::{AppConfig, AppState, Language, LinkMode, ModuleRegistry, Translations};
use wasm_bindgen::prelude::*;
use web_sys::Window;

mod events;
mod flicker;
mod measure;
mod render;
mod state;
mod storage;
mod utils;

use state::{STATE, State};
use storage::WebStorage;
use utils::{asset_url, fetch_text_with_fallbacks, get_query_param, log, now_ms};

fn config_from_query(search: &str) -> AppConfig {
    let link_mode = get_query_param(search, "links")
        .and_then(|v| LinkMode::from_param(&v))
        .unwrap_or_default();
    let language = get_query_param(search, "lang").and_then(|v| Language::from_param(&v));
    AppConfig {
        link_mode,
        language,
    }
}

/// Fetch `?catalog=<name>`; anything unusable falls back to the embedded catalog.
async fn load_catalog(window: &Window, name: &str) -> ModuleRegistry {
    let urls = [
        asset_url(name),
        asset_url(&format!("catalogs/{name}.json")),
        asset_url(&format!("{name}.json")),
    ];
    let Some(text) = fetch_text_with_fallbacks(window, &urls).await else {
        log::warn!("catalog `{name}` not found; using embedded catalog");
        return ModuleRegistry::builtin();
    };
    match ModuleRegistry::from_json(&text) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("catalog `{name}` rejected ({e}); using embedded catalog");
            ModuleRegistry::builtin()
        }
    }
}

fn boot(window: Window, registry: ModuleRegistry, config: AppConfig) -> Result<(), JsValue> {
    let document = window.document().ok_or("no document")?;
    let store = WebStorage::open(&window);
    let app = AppState::new(registry, Translations::builtin(), store, config);

    let state = Rc::new(RefCell::new(State {
        window,
        document,
        app,
        map_anchors: AnchorLocator::new(),
        sidebar_anchors: AnchorLocator::new(),
        map_pending: Vec::new(),
        sidebar_pending: Vec::new(),
        flicker: TagFlicker::new(now_ms() as u64),
        flicker_task: TaskSlot::new(),
        flash_expiry: None,
        editing_link: false,
        resizing_sidebar: false,
    }));

    if let Some(previous) = STATE.with(|st| st.replace(Some(state.clone()))) {
        previous.borrow_mut().teardown();
    }
    render::render_all(&mut state.borrow_mut())?;
    events::attach_ui(state.clone())?;
    flicker::start(&state);
    measure::schedule_all(&state, MeasureTrigger::Mounted);
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let search = window.location().search().unwrap_or_default();
    utils::init_logging(get_query_param(&search, "log").as_deref());
    let config = config_from_query(&search);

    match get_query_param(&search, "catalog") {
        Some(name) => {
            wasm_bindgen_futures::spawn_local(async move {
                let registry = load_catalog(&window, &name).await;
                if let Err(err) = boot(window, registry, config) {
                    log(&format!("start-up failed: {err:?}"));
                }
            });
            Ok(())
        }
        None => boot(window, ModuleRegistry::builtin(), config),
    }
}
