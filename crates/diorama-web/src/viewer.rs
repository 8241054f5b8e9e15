// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JavaScript entry point.

use std::cell::RefCell;
use std::rc::Rc;

use diorama_core::{SceneController, SceneSettings};
use diorama_wgpu::{GpuContext, GpuOptions};
use tracing::info;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::dispatch::{Dispatcher, WebController};
use crate::frames::AnimationFrames;
use crate::host::CanvasViewport;
use crate::loader::FetchLoader;
use crate::logging;

/// One 3D viewport bound to a canvas.
///
/// Create with `SceneViewer.create`, then `activate` when the canvas is
/// mounted and `deactivate` (or `free`) when it goes away. A viewer activates
/// at most once; mount a fresh viewer to show the scene again.
///
/// Give the canvas a CSS `width` and `height`. The viewer sizes the drawing
/// buffer from the canvas's layout box, so an unstyled canvas keeps growing
/// on high-DPI displays.
#[wasm_bindgen]
pub struct SceneViewer {
    controller: Rc<RefCell<WebController>>,
    dispatch: Rc<Dispatcher>,
    host: Option<CanvasViewport>,
}

#[wasm_bindgen]
impl SceneViewer {
    /// Parses settings and acquires a GPU device for `canvas`.
    ///
    /// `settings_json` is a JSON object; omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Rejects when the settings are invalid or no adapter/device is available.
    pub async fn create(
        canvas: HtmlCanvasElement,
        settings_json: Option<String>,
    ) -> Result<SceneViewer, JsError> {
        #[cfg(feature = "console-panic")]
        console_error_panic_hook::set_once();
        logging::init();

        let settings = match settings_json.as_deref() {
            Some(json) => SceneSettings::from_json(json.as_bytes())
                .map_err(|e| JsError::new(&e.to_string()))?,
            None => SceneSettings::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsError::new("no window"))?;

        let options = GpuOptions {
            clear_color: settings.clear_color,
            ..GpuOptions::default()
        };
        let gpu = GpuContext::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), &options)
            .await
            .map_err(|e| JsError::new(&e.to_string()))?;
        let gpu_name = gpu.adapter_name();

        let dispatch = Rc::new(Dispatcher::default());
        let frames = AnimationFrames::new(window.clone(), Rc::clone(&dispatch));
        let loader = FetchLoader::new(window.clone(), Rc::clone(&dispatch));
        let host = CanvasViewport::new(canvas, window, gpu, options, Rc::clone(&dispatch));
        let controller = Rc::new(RefCell::new(SceneController::new(settings, frames, loader)));
        dispatch.bind(&controller);
        info!(adapter = %gpu_name, "scene viewer created");

        Ok(Self {
            controller,
            dispatch,
            host: Some(host),
        })
    }

    /// Builds the scene, starts the asset load and (per loop policy) the
    /// frame loop.
    ///
    /// # Errors
    ///
    /// Fails when the viewer was already activated, the canvas has no size,
    /// or the surface cannot be created.
    pub fn activate(&mut self) -> Result<(), JsError> {
        let host = self
            .host
            .take()
            .ok_or_else(|| JsError::new("viewer already activated; create a new SceneViewer"))?;
        let mut controller = self
            .controller
            .try_borrow_mut()
            .map_err(|_| JsError::new("viewer is busy"))?;
        controller
            .activate(host)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Stops the loop, discards any pending load and releases the surface.
    /// Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        if let Ok(mut controller) = self.controller.try_borrow_mut() {
            controller.deactivate();
        }
    }

    /// Lifecycle phase: `idle`, `initializing`, `loading`, `running` or `stopped`.
    #[must_use]
    pub fn phase(&self) -> String {
        self.controller.borrow().phase().to_string()
    }

    /// Whether the viewer is between `activate` and `deactivate`.
    #[wasm_bindgen(js_name = isLive)]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.controller.borrow().is_live()
    }

    /// Frames submitted to the GPU since activation.
    #[wasm_bindgen(js_name = framesSubmitted)]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frames_submitted(&self) -> f64 {
        self.controller.borrow().frames_submitted() as f64
    }

    /// Called with an error message when a frame or resize fails and the
    /// loop halts. Pass `undefined` to clear.
    #[wasm_bindgen(js_name = setFatalHandler)]
    pub fn set_fatal_handler(&self, handler: Option<js_sys::Function>) {
        self.dispatch.set_fatal_handler(handler);
    }
}
