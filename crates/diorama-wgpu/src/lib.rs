// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `wgpu` render surface for Diorama scenes.
//!
//! Draws every mesh of a [`SceneGraph`](diorama_scene::SceneGraph) with a
//! depth-tested, Lambert-lit pipeline (ambient plus one directional light) and
//! an optional base-color texture. Frame cadence is owned by the caller.

mod context;
mod pipeline;
mod surface;
mod upload;

pub use context::GpuContext;
pub use surface::GpuSurface;

/// Device and surface options.
#[derive(Debug, Clone)]
pub struct GpuOptions {
    /// Backends the instance may use.
    pub backends: wgpu::Backends,
    /// Adapter preference.
    pub power_preference: wgpu::PowerPreference,
    /// Requested MSAA sample count; falls back to 1 when unsupported.
    pub sample_count: u32,
    /// Background color (linear RGBA).
    pub clear_color: [f32; 4],
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            sample_count: 4,
            clear_color: [0.02, 0.02, 0.03, 1.0],
        }
    }
}
