// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Routes browser callbacks back into the controller.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use diorama_core::{HostEvent, SceneController};
use tracing::{error, trace, warn};
use wasm_bindgen::JsValue;

use crate::frames::AnimationFrames;
use crate::host::CanvasViewport;
use crate::loader::FetchLoader;

pub(crate) type WebController = SceneController<CanvasViewport, AnimationFrames, FetchLoader>;

/// Shared by every browser adapter. Holds the controller weakly, so callbacks
/// that outlive the viewer find nothing to deliver to.
#[derive(Default)]
pub(crate) struct Dispatcher {
    target: RefCell<Weak<RefCell<WebController>>>,
    fatal: RefCell<Option<js_sys::Function>>,
}

impl Dispatcher {
    pub fn bind(&self, controller: &Rc<RefCell<WebController>>) {
        *self.target.borrow_mut() = Rc::downgrade(controller);
    }

    pub fn set_fatal_handler(&self, handler: Option<js_sys::Function>) {
        *self.fatal.borrow_mut() = handler;
    }

    pub fn deliver(&self, event: HostEvent) {
        let Some(target) = self.target.borrow().upgrade() else {
            trace!("viewer dropped; event discarded");
            return;
        };
        let result = match target.try_borrow_mut() {
            Ok(mut controller) => controller.handle(event),
            Err(_) => {
                warn!("controller busy; event dropped");
                return;
            }
        };
        if let Err(err) = result {
            error!(%err, "scene halted");
            self.report_fatal(&err.to_string());
        }
    }

    pub fn report_fatal(&self, message: &str) {
        let handler = self.fatal.borrow().clone();
        if let Some(handler) = handler {
            if let Err(err) = handler.call1(&JsValue::NULL, &JsValue::from_str(message)) {
                warn!(error = %js_error_string(&err), "fatal handler threw");
            }
        }
    }
}

/// Best-effort message from a thrown JS value.
pub(crate) fn js_error_string(value: &JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    if let Some(exception) = value.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
