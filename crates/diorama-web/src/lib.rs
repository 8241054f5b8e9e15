// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Browser host for Diorama scenes.
//!
//! Wires a [`SceneController`](diorama_core::SceneController) to a canvas:
//! `ResizeObserver` for viewport changes, `requestAnimationFrame` for the frame
//! loop, and `fetch` plus the glTF decoder for the asset.
//!
//! # Usage (from JavaScript)
//!
//! ```js
//! import init, { SceneViewer } from 'diorama-web';
//!
//! await init();
//! const viewer = await SceneViewer.create(canvas, JSON.stringify({ loop_policy: "after_load" }));
//! viewer.setFatalHandler((message) => console.error(message));
//! viewer.activate();
//! // ...on unmount
//! viewer.deactivate();
//! viewer.free();
//! ```

#![cfg_attr(target_arch = "wasm32", allow(unsafe_code))]

mod outcome;
mod pixels;

#[cfg(target_arch = "wasm32")]
mod dispatch;
#[cfg(target_arch = "wasm32")]
mod frames;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod loader;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod viewer;

pub use pixels::device_pixel_size;

#[cfg(target_arch = "wasm32")]
pub use viewer::SceneViewer;
