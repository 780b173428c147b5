//! `HTMLMediaElement` as a controller media element

use crate::dispatch::Dispatcher;
use castline_core::{MediaElement, MediaHook, PlayOutcome, SessionEvent, SessionToken};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, HtmlMediaElement};

struct Listener {
    token: SessionToken,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

/// Wraps a `<video>` (or `<audio>`) element
pub struct VideoElement {
    element: HtmlMediaElement,
    dispatcher: Dispatcher,
    source: Option<String>,
    listeners: Vec<Listener>,
}

impl VideoElement {
    pub fn new(element: HtmlMediaElement, dispatcher: Dispatcher) -> Self {
        Self {
            element,
            dispatcher,
            source: None,
            listeners: Vec::new(),
        }
    }

    pub fn element(&self) -> &HtmlMediaElement {
        &self.element
    }

    fn remove_listener(&self, listener: &Listener) {
        let _ = self.element.remove_event_listener_with_callback(
            listener.event,
            listener.callback.as_ref().unchecked_ref(),
        );
    }

    /// Drop listeners armed for earlier load attempts
    fn disarm_except(&mut self, token: SessionToken) {
        let (keep, stale): (Vec<_>, Vec<_>) = self.listeners.drain(..).partition(|l| l.token == token);
        for listener in &stale {
            self.remove_listener(listener);
        }
        self.listeners = keep;
    }
}

impl Drop for VideoElement {
    fn drop(&mut self) {
        for listener in &self.listeners {
            self.remove_listener(listener);
        }
    }
}

fn rejection_reason(err: &JsValue) -> String {
    if let Some(err) = err.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    err.as_string().unwrap_or_else(|| "play() request failed".to_string())
}

impl MediaElement for VideoElement {
    fn set_source(&mut self, url: &str) {
        self.element.set_src(url);
        self.source = Some(url.to_string());
    }

    fn clear_source(&mut self) {
        if let Err(e) = self.element.remove_attribute("src") {
            web_sys::console::warn_1(&e);
        }
        self.source = None;
    }

    fn reload(&mut self) {
        self.element.load();
    }

    fn pause(&mut self) {
        if let Err(e) = self.element.pause() {
            web_sys::console::warn_1(&e);
        }
    }

    fn play(&mut self, token: SessionToken) -> PlayOutcome {
        let promise = match self.element.play() {
            Ok(promise) => promise,
            Err(e) => return PlayOutcome::Rejected(rejection_reason(&e)),
        };

        let dispatcher = self.dispatcher.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let event = match JsFuture::from(promise).await {
                Ok(_) => SessionEvent::PlayStarted,
                Err(e) => SessionEvent::PlayRejected {
                    reason: rejection_reason(&e),
                },
            };
            dispatcher.dispatch(token, event);
        });

        PlayOutcome::Pending
    }

    fn can_play_type(&self, mime_type: &str) -> bool {
        // "" means no, "maybe" and "probably" both count
        !self.element.can_play_type(mime_type).is_empty()
    }

    fn arm_once(&mut self, token: SessionToken, hook: MediaHook) {
        self.disarm_except(token);

        let dispatcher = self.dispatcher.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            let event = match hook {
                MediaHook::MetadataLoaded => SessionEvent::MetadataLoaded,
                MediaHook::PlaybackError => SessionEvent::PlaybackError,
            };
            dispatcher.dispatch(token, event);
        });

        let options = AddEventListenerOptions::new();
        options.set_once(true);
        let event = hook.dom_event();
        if let Err(e) = self.element.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        ) {
            web_sys::console::error_1(&e);
            return;
        }

        self.listeners.push(Listener { token, event, callback });
    }

    fn disarm(&mut self) {
        for listener in std::mem::take(&mut self.listeners) {
            self.remove_listener(&listener);
        }
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
