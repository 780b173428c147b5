//! hls.js as a streaming engine
//!
//! Expects the `Hls` global from the hls.js UMD bundle.

use crate::dispatch::Dispatcher;
use crate::media::VideoElement;
use castline_core::{
    EngineBackend, EngineConfig, EngineErrorClass, EngineErrorEvent, Error, Result, SanitizedUrl,
    SessionEvent, SessionToken, StreamingEngine,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlMediaElement;

const MEDIA_ATTACHED: &str = "hlsMediaAttached";
const MANIFEST_PARSED: &str = "hlsManifestParsed";
const ERROR: &str = "hlsError";

#[wasm_bindgen]
extern "C" {
    type Hls;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported, catch)]
    fn is_supported() -> std::result::Result<bool, JsValue>;

    #[wasm_bindgen(constructor, catch)]
    fn new(config: &JsValue) -> std::result::Result<Hls, JsValue>;

    #[wasm_bindgen(method, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &HtmlMediaElement);

    #[wasm_bindgen(method, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method, js_name = recoverMediaError)]
    fn recover_media_error(this: &Hls);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, callback: &js_sys::Function);
}

/// Subset of the hls.js config object the controller tunes
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HlsConfig {
    max_buffer_hole: f64,
    max_buffer_length: f64,
    low_latency_mode: bool,
    enable_worker: bool,
}

impl From<&EngineConfig> for HlsConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_buffer_hole: config.buffer_gap_tolerance_secs,
            max_buffer_length: config.forward_buffer_secs,
            low_latency_mode: config.low_latency,
            enable_worker: config.background_parsing,
        }
    }
}

fn read_string(data: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(data, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

/// Translate the `data` argument of an `hlsError` callback
fn error_event(data: &JsValue) -> EngineErrorEvent {
    let fatal = js_sys::Reflect::get(data, &JsValue::from_str("fatal"))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let class = EngineErrorClass::from_hls_type(&read_string(data, "type").unwrap_or_default());
    let detail = read_string(data, "details").unwrap_or_else(|| "unknownError".to_string());

    let event = EngineErrorEvent::new(fatal, class, detail);
    match read_string(data, "url") {
        Some(url) => event.with_url(url),
        None => event,
    }
}

/// Creates one `Hls` instance per session
pub struct HlsBackend {
    dispatcher: Dispatcher,
}

impl HlsBackend {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl EngineBackend for HlsBackend {
    type Media = VideoElement;
    type Engine = HlsEngine;

    fn is_supported(&self) -> bool {
        Hls::is_supported().unwrap_or(false)
    }

    fn create(&mut self, config: &EngineConfig, token: SessionToken) -> Result<HlsEngine> {
        let options = HlsConfig::from(config)
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| Error::UnrecoverableFault { detail: e.to_string() })?;
        let hls = Hls::new(&options).map_err(|e| Error::UnrecoverableFault {
            detail: e.as_string().unwrap_or_else(|| "hls.js could not be constructed".to_string()),
        })?;

        let mut engine = HlsEngine {
            hls,
            callbacks: Vec::with_capacity(3),
        };

        let dispatcher = self.dispatcher.clone();
        engine.listen(MEDIA_ATTACHED, move |_| {
            dispatcher.dispatch(token, SessionEvent::MediaAttached);
        });
        let dispatcher = self.dispatcher.clone();
        engine.listen(MANIFEST_PARSED, move |_| {
            dispatcher.dispatch(token, SessionEvent::ManifestParsed);
        });
        let dispatcher = self.dispatcher.clone();
        engine.listen(ERROR, move |data| {
            dispatcher.dispatch(token, SessionEvent::EngineError(error_event(&data)));
        });

        Ok(engine)
    }
}

pub struct HlsEngine {
    hls: Hls,
    callbacks: Vec<Closure<dyn FnMut(JsValue, JsValue)>>,
}

impl HlsEngine {
    fn listen(&mut self, event: &str, mut handler: impl FnMut(JsValue) + 'static) {
        let callback = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_name: JsValue, data: JsValue| {
            handler(data)
        });
        self.hls.on(event, callback.as_ref().unchecked_ref());
        self.callbacks.push(callback);
    }
}

impl StreamingEngine for HlsEngine {
    type Media = VideoElement;

    fn attach_media(&mut self, media: &mut VideoElement) {
        self.hls.attach_media(media.element());
    }

    fn load_source(&mut self, url: &SanitizedUrl) {
        self.hls.load_source(url.as_str());
    }

    fn recover_media_error(&mut self) {
        self.hls.recover_media_error();
    }

    fn destroy(self) {
        // Unregisters every `on` handler before the closures are dropped
        self.hls.destroy();
    }
}
