use log::{Level, LevelFilter, Metadata, Record};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Window;

/// Log a message to the browser console, bypassing the level filter.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Forwards `log` records to the matching `console` method.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::info_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger. `level` comes from `?log=`; defaults to `warn`.
pub fn init_logging(level: Option<&str>) {
    let filter = match level.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("error") => LevelFilter::Error,
        Some("off") => LevelFilter::Off,
        _ => LevelFilter::Warn,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(filter);
    }
}

/// Milliseconds since the epoch, from the JS clock.
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Resolve a catalog or image reference against `window.__BASE_URL` (default `/`).
/// Absolute `http(s)` references from a catalog are used as they are.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") {
        return p.to_string();
    }
    let base = web_sys::window()
        .and_then(|w| js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok())
        .and_then(|v| v.as_string())
        .unwrap_or_default();
    format!("{}/{}", base.trim_end_matches('/'), p.trim_start_matches('/'))
}

async fn fetch_text(window: &Window, url: &str) -> Result<String, String> {
    let resp = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("{e:?}"))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| "not a Response".to_string())?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let promise = resp.text().map_err(|e| format!("{e:?}"))?;
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| format!("{e:?}"))?
        .as_string()
        .ok_or_else(|| "body is not text".to_string())
}

/// Body of the first candidate URL that answers, trying them in order.
pub async fn fetch_text_with_fallbacks(window: &Window, urls: &[String]) -> Option<String> {
    for url in urls {
        match fetch_text(window, url).await {
            Ok(text) => {
                log::info!("catalog loaded from {url}");
                return Some(text);
            }
            Err(reason) => log::debug!("catalog candidate {url}: {reason}"),
        }
    }
    None
}

/// Value of `key` in a `?a=1&b=2` query string, percent-decoded.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| url_decode(v))
}

fn url_decode(s: &str) -> String {
    let s = s.replace('+', " ");
    let decoded = percent_encoding::percent_decode_str(&s)
        .decode_utf8()
        .map(|c| c.into_owned())
        .ok();
    decoded.unwrap_or(s)
}
