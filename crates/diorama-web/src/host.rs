// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canvas-backed viewport host.

use std::rc::Rc;

use diorama_core::HostEvent;
use diorama_scene::{HostError, ResizeSubscription, SurfaceError, ViewportHost, ViewportSize};
use diorama_wgpu::{GpuContext, GpuOptions, GpuSurface};
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, ResizeObserver, Window};

use crate::device_pixel_size;
use crate::dispatch::{js_error_string, Dispatcher};

struct ResizeWatch {
    subscription: ResizeSubscription,
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

/// Viewport host backed by an `HtmlCanvasElement`.
///
/// Owns the GPU context until the first surface is created from it.
///
/// The canvas must get its layout size from CSS (a fixed or percentage
/// `width` and `height`). The drawing buffer is set to the CSS size times
/// `devicePixelRatio`; a canvas sized only by its buffer would grow on every
/// observed resize when the ratio is above 1.
pub(crate) struct CanvasViewport {
    canvas: HtmlCanvasElement,
    window: Window,
    gpu: Option<GpuContext>,
    options: GpuOptions,
    dispatch: Rc<Dispatcher>,
    watch: Option<ResizeWatch>,
    next_subscription: u64,
}

impl CanvasViewport {
    pub fn new(
        canvas: HtmlCanvasElement,
        window: Window,
        gpu: GpuContext,
        options: GpuOptions,
        dispatch: Rc<Dispatcher>,
    ) -> Self {
        Self {
            canvas,
            window,
            gpu: Some(gpu),
            options,
            dispatch,
            watch: None,
            next_subscription: 0,
        }
    }
}

fn measure(canvas: &HtmlCanvasElement, window: &Window) -> ViewportSize {
    device_pixel_size(
        f64::from(canvas.client_width()),
        f64::from(canvas.client_height()),
        window.device_pixel_ratio(),
    )
}

/// Sets the drawing buffer only. Layout size stays with CSS.
fn apply_size(canvas: &HtmlCanvasElement, size: ViewportSize) {
    canvas.set_width(size.width);
    canvas.set_height(size.height);
}

impl ViewportHost for CanvasViewport {
    type Surface = GpuSurface;

    fn size(&self) -> ViewportSize {
        measure(&self.canvas, &self.window)
    }

    fn create_surface(&mut self, size: ViewportSize) -> Result<GpuSurface, SurfaceError> {
        let context = self.gpu.take().ok_or_else(|| {
            SurfaceError::Unavailable("gpu context already consumed by an earlier activation".into())
        })?;
        apply_size(&self.canvas, size);
        GpuSurface::new(context, size, &self.options)
    }

    fn subscribe_resize(&mut self) -> Result<ResizeSubscription, HostError> {
        let canvas = self.canvas.clone();
        let window = self.window.clone();
        let dispatch = Rc::clone(&self.dispatch);
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
            let size = measure(&canvas, &window);
            if !size.is_empty() {
                apply_size(&canvas, size);
            }
            dispatch.deliver(HostEvent::Resized(size));
        });
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|err| HostError::Subscribe(js_error_string(&err)))?;
        observer.observe(&self.canvas);

        self.next_subscription += 1;
        let subscription = ResizeSubscription(self.next_subscription);
        if let Some(previous) = self.watch.replace(ResizeWatch {
            subscription,
            observer,
            _callback: callback,
        }) {
            previous.observer.disconnect();
        }
        debug!("resize observer attached");
        Ok(subscription)
    }

    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription) {
        if self
            .watch
            .as_ref()
            .is_some_and(|w| w.subscription == subscription)
        {
            if let Some(watch) = self.watch.take() {
                watch.observer.disconnect();
                debug!("resize observer disconnected");
            }
        }
    }
}

impl Drop for CanvasViewport {
    fn drop(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.observer.disconnect();
        }
    }
}
