// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Instance, adapter and device acquisition.

use diorama_scene::SurfaceError;
use tracing::{debug, error, info};

use crate::GpuOptions;

/// A device bound to one presentable surface, not yet configured.
///
/// Acquiring the adapter and device is asynchronous; configuring the surface
/// for a size is not. Hosts build the context up front and hand it to
/// [`GpuSurface::new`](crate::GpuSurface::new) when the scene activates.
pub struct GpuContext {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
}

impl core::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter.get_info().name)
            .field("backend", &self.adapter.get_info().backend)
            .finish_non_exhaustive()
    }
}

impl GpuContext {
    /// Acquire a device able to present to `target`.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        options: &GpuOptions,
    ) -> Result<Self, SurfaceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: options.backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|err| SurfaceError::Unavailable(err.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| SurfaceError::Unavailable(err.to_string()))?;

        let info = adapter.get_info();
        let base_limits = if info.backend == wgpu::Backend::Gl {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::downlevel_defaults()
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("diorama-device"),
                required_features: wgpu::Features::empty(),
                required_limits: base_limits.using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .map_err(|err| SurfaceError::Device(err.to_string()))?;

        let on_error: Box<dyn wgpu::UncapturedErrorHandler> = Box::new(|err: wgpu::Error| {
            error!(%err, "wgpu uncaptured error");
        });
        device.on_uncaptured_error(on_error.into());

        info!(adapter = %info.name, backend = ?info.backend, "gpu device ready");
        debug!(max_texture = device.limits().max_texture_dimension_2d, "device limits");
        Ok(Self {
            surface,
            adapter,
            device,
            queue,
        })
    }

    /// Name of the selected adapter.
    pub fn adapter_name(&self) -> String {
        self.adapter.get_info().name
    }
}
