// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port contract for Diorama.
//!
//! This crate defines the domain types shared by the scene controller and its
//! adapters (GPU surface, browser host, asset decoder). It performs no I/O and
//! owns no timing.
//!
//! # Design Principles
//!
//! - **Surfaces are dumb**: they receive a scene and a camera and draw. No lifecycle logic.
//! - **No time ownership**: frame cadence comes from a [`FrameScheduler`], never the renderer.
//! - **Activation-scoped tickets**: load results carry the activation that asked for them.

use thiserror::Error;

mod camera;
mod graph;
mod light;
mod mesh;
mod port;
mod types;

pub use camera::CameraRig;
pub use graph::{SceneGraph, SceneNode};
pub use light::{AmbientLight, DirectionalLight, Light};
pub use mesh::{Material, Mesh, Texture};
pub use port::{AssetLoader, FrameScheduler, RenderSurface, ViewportHost};
pub use types::{
    AssetSource, ColorRgb, FrameHandle, LoadRequest, LoadTicket, ResizeSubscription, Transform,
    ViewportSize,
};

/// Failure of the drawable render target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The viewport has no drawable area.
    #[error("viewport has zero area ({width}x{height})")]
    ZeroSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The drawable target could not be acquired.
    #[error("render surface unavailable: {0}")]
    Unavailable(String),
    /// The graphics device rejected a request.
    #[error("graphics device error: {0}")]
    Device(String),
    /// The surface was already disposed.
    #[error("render surface already disposed")]
    Disposed,
    /// The graphics subsystem ran out of memory.
    #[error("out of graphics memory")]
    OutOfMemory,
}

/// Failure to fetch or decode the external asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The asset bytes could not be fetched.
    #[error("fetch failed for {url}: {reason}")]
    Fetch {
        /// Asset location that was requested.
        url: String,
        /// Transport-level reason.
        reason: String,
    },
    /// The asset bytes were fetched but could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The request was aborted by its issuer.
    #[error("load aborted")]
    Aborted,
}

/// Failure reported by the viewport host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host could not deliver resize notifications.
    #[error("resize subscription failed: {0}")]
    Subscribe(String),
}
