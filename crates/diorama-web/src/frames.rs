// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `requestAnimationFrame` scheduler.

use std::cell::Cell;
use std::rc::Rc;

use diorama_core::HostEvent;
use diorama_scene::{FrameHandle, FrameScheduler};
use tracing::error;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::dispatch::{js_error_string, Dispatcher};

/// One persistent callback, at most one frame pending.
pub(crate) struct AnimationFrames {
    window: web_sys::Window,
    pending: Rc<Cell<Option<(FrameHandle, i32)>>>,
    callback: Closure<dyn FnMut(f64)>,
    next: u64,
}

impl AnimationFrames {
    pub fn new(window: web_sys::Window, dispatch: Rc<Dispatcher>) -> Self {
        let pending: Rc<Cell<Option<(FrameHandle, i32)>>> = Rc::new(Cell::new(None));
        let slot = Rc::clone(&pending);
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp_ms: f64| {
            if let Some((handle, _)) = slot.take() {
                dispatch.deliver(HostEvent::Frame {
                    handle,
                    timestamp_ms,
                });
            }
        });
        Self {
            window,
            pending,
            callback,
            next: 0,
        }
    }
}

impl FrameScheduler for AnimationFrames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.pending.set(Some((handle, id))),
            Err(err) => error!(error = %js_error_string(&err), "requestAnimationFrame failed"),
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some((pending, id)) = self.pending.get() {
            if pending == handle {
                self.pending.set(None);
                if let Err(err) = self.window.cancel_animation_frame(id) {
                    error!(error = %js_error_string(&err), "cancelAnimationFrame failed");
                }
            }
        }
    }
}
