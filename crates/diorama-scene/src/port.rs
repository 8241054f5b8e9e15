// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port traits between the scene controller and its environment.
//!
//! # Design
//!
//! These are hexagonal ports. The controller drives them; adapters (wgpu,
//! browser, headless mocks) implement them. Completions never flow back through
//! these traits: adapters report frame ticks, resizes and load results to the
//! controller as events, always on the controller's own thread.

use crate::{
    CameraRig, FrameHandle, HostError, LoadRequest, LoadTicket, ResizeSubscription, SceneGraph,
    SurfaceError, ViewportSize,
};

/// Drawable render target bound to a host viewport.
pub trait RenderSurface {
    /// Current drawable size.
    fn size(&self) -> ViewportSize;

    /// Resize the drawable to `size`.
    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError>;

    /// Draw `scene` as seen through `camera` and submit the frame.
    ///
    /// Submission is asynchronous to the graphics subsystem; returning `Ok`
    /// does not mean the frame is on screen yet.
    fn render(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<(), SurfaceError>;

    /// Release all graphics resources.
    ///
    /// Must tolerate repeated calls; only the first one releases anything.
    fn dispose(&mut self);
}

/// Host environment providing the viewport the scene is drawn into.
pub trait ViewportHost {
    /// Surface type this host creates.
    type Surface: RenderSurface;

    /// Current viewport size.
    fn size(&self) -> ViewportSize;

    /// Create a render surface attached to the viewport.
    fn create_surface(&mut self, size: ViewportSize) -> Result<Self::Surface, SurfaceError>;

    /// Start delivering resize notifications.
    fn subscribe_resize(&mut self) -> Result<ResizeSubscription, HostError>;

    /// Stop delivering resize notifications for `subscription`.
    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription);
}

/// Display scheduler: "notify me before the next frame is drawn".
///
/// Cadence follows the display refresh and is not fixed-interval.
pub trait FrameScheduler {
    /// Request one notification before the next frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending notification. Unknown or fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Asynchronous fetch-and-decode of one external asset.
///
/// For every request the loader reports exactly one of success or failure,
/// exactly once, or nothing at all once the request is abandoned.
pub trait AssetLoader {
    /// Begin loading. Must return without waiting for the result.
    fn load(&mut self, request: LoadRequest);

    /// The issuer no longer wants the result of `ticket`.
    ///
    /// Loaders that cannot cancel in-flight work may ignore this; the
    /// controller discards late results on its own.
    fn abandon(&mut self, _ticket: LoadTicket) {}
}
