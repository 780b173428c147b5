//! Castline WASM - browser binding for the stream session controller
//!
//! Drives an `HTMLVideoElement` through hls.js (or the browser's native HLS
//! support) with the same session rules as `castline-core`.
//!
//! ## Usage
//!
//! ```javascript
//! import init, { CastlinePlayer } from '@castline/wasm';
//!
//! await init();
//! const player = new CastlinePlayer(document.querySelector('video'));
//! player.onStatus(record => console.log(record.severity, record.message));
//! player.setUrl('https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8');
//! player.loadStream();
//! ```

use castline_core::{catalog, ControllerConfig, StreamController};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::HtmlMediaElement;

mod dispatch;
mod hls;
mod media;

pub use dispatch::Dispatcher;
pub use hls::{HlsBackend, HlsEngine};
pub use media::VideoElement;

pub(crate) type Controller = StreamController<HlsBackend>;

/// Serialize to plain JS objects (no `Map`s)
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn js_error(err: castline_core::Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&format!("[Castline WASM] v{} initialized", castline_core::VERSION).into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Built-in sample streams
#[wasm_bindgen]
pub fn presets() -> Result<JsValue, JsValue> {
    to_js(&catalog::presets())
}

/// Stream session controller bound to one media element
#[wasm_bindgen]
pub struct CastlinePlayer {
    controller: Rc<RefCell<Controller>>,
    dispatcher: Dispatcher,
}

#[wasm_bindgen]
impl CastlinePlayer {
    /// Bind to `video`. `config` is an optional `ControllerConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(video: HtmlMediaElement, config: JsValue) -> Result<CastlinePlayer, JsValue> {
        let config: ControllerConfig = if config.is_undefined() || config.is_null() {
            ControllerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let dispatcher = Dispatcher::new();
        let mut controller =
            StreamController::with_config(HlsBackend::new(dispatcher.clone()), config).map_err(js_error)?;
        controller.bind_media(VideoElement::new(video, dispatcher.clone()));

        let controller = Rc::new(RefCell::new(controller));
        dispatcher.bind(&controller);

        Ok(Self { controller, dispatcher })
    }

    /// Replace the URL input text
    #[wasm_bindgen(js_name = setUrl)]
    pub fn set_url(&self, text: String) {
        self.controller.borrow_mut().set_url(text);
    }

    /// Current URL input text (sanitized after a successful load)
    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.controller.borrow().url().to_string()
    }

    /// Start a new load attempt from the current URL
    #[wasm_bindgen(js_name = loadStream)]
    pub fn load_stream(&self) {
        self.controller.borrow_mut().load_stream();
        self.dispatcher.drain();
    }

    /// Load a catalog preset by id
    #[wasm_bindgen(js_name = loadPreset)]
    pub fn load_preset(&self, id: &str) -> Result<(), JsValue> {
        let preset = catalog::find(id).ok_or_else(|| JsValue::from_str(&format!("Unknown preset '{}'", id)))?;
        self.controller.borrow_mut().set_url(preset.url);
        self.load_stream();
        Ok(())
    }

    #[wasm_bindgen(getter, js_name = statusMessage)]
    pub fn status_message(&self) -> String {
        self.controller.borrow().status().message
    }

    /// "info", "error" or "success"
    #[wasm_bindgen(getter, js_name = statusSeverity)]
    pub fn status_severity(&self) -> String {
        self.controller.borrow().status().severity.to_string()
    }

    /// URL of the active session, if any. `url` holds the request text.
    #[wasm_bindgen(getter, js_name = sessionUrl)]
    pub fn session_url(&self) -> Option<String> {
        self.controller.borrow().session_url().map(|u| u.to_string())
    }

    /// Observer record `{ currentStatus, currentUrl, recoveryAttempts }`
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.controller.borrow().view())
    }

    /// Recent status records, oldest first
    pub fn history(&self) -> Result<JsValue, JsValue> {
        let controller = self.controller.borrow();
        let records: Vec<_> = controller.history().records().collect();
        to_js(&records)
    }

    /// Call `callback(record)` for every status change
    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: Option<js_sys::Function>) {
        self.dispatcher.set_listener(callback);
    }

    /// Tear down the active session; the player can load again afterwards
    pub fn dispose(&self) {
        self.controller.borrow_mut().teardown();
    }
}
