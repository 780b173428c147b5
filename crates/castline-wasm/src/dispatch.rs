//! Event queue between JS callbacks and the controller
//!
//! hls.js and the media element call back from the JS event loop, sometimes
//! synchronously from inside a controller directive. Events are queued and
//! drained whenever the controller is not already borrowed.

use crate::{to_js, Controller};
use castline_core::{SessionEvent, SessionToken, StatusRecord};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;

#[derive(Default)]
struct Inner {
    queue: RefCell<VecDeque<(SessionToken, SessionEvent)>>,
    controller: RefCell<Weak<RefCell<Controller>>>,
    listener: RefCell<Option<js_sys::Function>>,
    notified: Cell<u64>,
}

/// Cheap handle shared by the engine, the media element and the player
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Rc<Inner>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the dispatcher at the controller it feeds
    pub fn bind(&self, controller: &Rc<RefCell<Controller>>) {
        *self.inner.controller.borrow_mut() = Rc::downgrade(controller);
    }

    /// Status callback, invoked once per status record
    pub fn set_listener(&self, callback: Option<js_sys::Function>) {
        *self.inner.listener.borrow_mut() = callback;
    }

    pub fn dispatch(&self, token: SessionToken, event: SessionEvent) {
        self.inner.queue.borrow_mut().push_back((token, event));
        self.drain();
    }

    /// Deliver queued events, then notify the status listener
    pub fn drain(&self) {
        let Some(controller) = self.inner.controller.borrow().upgrade() else {
            return;
        };

        {
            let Ok(mut ctrl) = controller.try_borrow_mut() else {
                return;
            };
            loop {
                let next = self.inner.queue.borrow_mut().pop_front();
                let Some((token, event)) = next else {
                    break;
                };
                ctrl.handle_event(token, event);
            }
        }

        self.notify(&controller);
    }

    fn notify(&self, controller: &Rc<RefCell<Controller>>) {
        let Ok(ctrl) = controller.try_borrow() else {
            return;
        };
        let since = self.inner.notified.get();
        let fresh: Vec<StatusRecord> = ctrl
            .history()
            .records()
            .filter(|r| r.sequence > since)
            .cloned()
            .collect();
        self.inner.notified.set(ctrl.history().total());
        drop(ctrl);

        let listener = self.inner.listener.borrow().clone();
        let Some(listener) = listener else {
            return;
        };
        for record in fresh {
            match to_js(&record) {
                Ok(value) => {
                    if let Err(e) = listener.call1(&JsValue::NULL, &value) {
                        web_sys::console::error_2(&"[Castline] status listener threw".into(), &e);
                    }
                }
                Err(e) => web_sys::console::error_1(&e),
            }
        }
    }
}
