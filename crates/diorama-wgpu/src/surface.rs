// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`RenderSurface`] implementation on a configured `wgpu` surface.

use diorama_scene::{CameraRig, RenderSurface, SceneGraph, SurfaceError, Texture, ViewportSize};
use tracing::{debug, info, trace, warn};

use crate::context::GpuContext;
use crate::pipeline::{Pipelines, RenderTargets, DEPTH_FORMAT};
use crate::upload::{create_rgba_texture, upload_scene, Globals, SceneUpload, UploadContext};
use crate::GpuOptions;

/// Drawable surface bound to one viewport.
///
/// Uploads are cached per scene revision, so a static scene costs one globals
/// write per frame. After [`dispose`](RenderSurface::dispose) every call
/// except `size` and `dispose` fails with [`SurfaceError::Disposed`].
pub struct GpuSurface {
    size: ViewportSize,
    state: Option<SurfaceState>,
}

struct SurfaceState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    max_tex: u32,
    sample_count: u32,
    clear: wgpu::Color,
    pipelines: Pipelines,
    targets: RenderTargets,
    globals_buf: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    white: wgpu::Texture,
    white_view: wgpu::TextureView,
    upload: SceneUpload,
}

impl core::fmt::Debug for GpuSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GpuSurface")
            .field("size", &self.size)
            .field("disposed", &self.state.is_none())
            .finish()
    }
}

impl GpuSurface {
    /// Configure `context`'s surface for `size` and build the mesh pipeline.
    pub fn new(
        context: GpuContext,
        size: ViewportSize,
        options: &GpuOptions,
    ) -> Result<Self, SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::ZeroSize {
                width: size.width,
                height: size.height,
            });
        }
        let GpuContext {
            surface,
            adapter,
            device,
            queue,
        } = context;

        let caps = surface.get_capabilities(&adapter);
        let format = pick_format(&caps.formats).ok_or_else(|| {
            SurfaceError::Unavailable("surface is not supported by the adapter".into())
        })?;
        let sample_count = {
            let color = adapter.get_texture_format_features(format).flags;
            let depth = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
            if color.sample_count_supported(options.sample_count)
                && depth.sample_count_supported(options.sample_count)
            {
                options.sample_count
            } else {
                warn!(requested = options.sample_count, "multisampling unsupported; using 1");
                1
            }
        };
        let max_tex = device.limits().max_texture_dimension_2d;
        let (width, height) = surface_extent(size, max_tex);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipelines = Pipelines::new(&device, format, sample_count);
        let targets = RenderTargets::new(&device, format, width, height, sample_count);
        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout: &pipelines.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("base_color_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let white = create_rgba_texture(
            &device,
            &queue,
            "white",
            &Texture {
                width: 1,
                height: 1,
                rgba: vec![255; 4],
            },
        );
        let white_view = white.create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b, a] = options.clear_color;

        info!(width, height, ?format, sample_count, "render surface configured");
        Ok(Self {
            size,
            state: Some(SurfaceState {
                surface,
                device,
                queue,
                config,
                max_tex,
                sample_count,
                clear: wgpu::Color {
                    r: f64::from(r),
                    g: f64::from(g),
                    b: f64::from(b),
                    a: f64::from(a),
                },
                pipelines,
                targets,
                globals_buf,
                globals_bg,
                sampler,
                white,
                white_view,
                upload: SceneUpload::empty(),
            }),
        })
    }

    /// Meshes uploaded for the last rendered scene revision.
    pub fn uploaded_meshes(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.upload.meshes.len())
    }
}

impl SurfaceState {
    fn sync_scene(&mut self, scene: &SceneGraph) {
        if self.upload.revision == scene.revision() {
            return;
        }
        self.upload.destroy();
        let ctx = UploadContext {
            device: &self.device,
            queue: &self.queue,
            layout: &self.pipelines.mesh_layout,
            sampler: &self.sampler,
            white: &self.white_view,
            max_texture_dimension: self.max_tex,
        };
        self.upload = upload_scene(&ctx, scene);
        debug!(
            revision = scene.revision(),
            meshes = self.upload.meshes.len(),
            "scene uploaded"
        );
    }

    /// Next swapchain image. `None` skips this frame.
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, SurfaceError> {
        match self.surface.get_current_texture() {
            Ok(frame) => return Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface acquire timed out; skipping frame");
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(SurfaceError::OutOfMemory),
            Err(err) => return Err(SurfaceError::Device(err.to_string())),
        }
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Timeout) => Ok(None),
            Err(wgpu::SurfaceError::OutOfMemory) => Err(SurfaceError::OutOfMemory),
            Err(err) => Err(SurfaceError::Unavailable(err.to_string())),
        }
    }

    fn configure(&mut self, size: ViewportSize) {
        let (width, height) = surface_extent(size, self.max_tex);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets.destroy();
        self.targets = RenderTargets::new(
            &self.device,
            self.config.format,
            width,
            height,
            self.sample_count,
        );
    }

    fn destroy(mut self) {
        self.upload.destroy();
        self.targets.destroy();
        self.globals_buf.destroy();
        self.white.destroy();
    }
}

impl RenderSurface for GpuSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        let state = self.state.as_mut().ok_or(SurfaceError::Disposed)?;
        if size.is_empty() {
            return Err(SurfaceError::ZeroSize {
                width: size.width,
                height: size.height,
            });
        }
        state.configure(size);
        self.size = size;
        Ok(())
    }

    fn render(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<(), SurfaceError> {
        let state = self.state.as_mut().ok_or(SurfaceError::Disposed)?;
        state.sync_scene(scene);
        let globals = Globals::new(scene, camera);
        state
            .queue
            .write_buffer(&state.globals_buf, 0, bytemuck::bytes_of(&globals));

        let Some(frame) = state.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (color_view, resolve_target) = match &state.targets.msaa {
            Some((_, msaa)) => (msaa, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(state.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &state.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_bind_group(0, &state.globals_bg, &[]);
            for mesh in &state.upload.meshes {
                let pipeline = if mesh.double_sided {
                    &state.pipelines.mesh_double
                } else {
                    &state.pipelines.mesh
                };
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(1, &mesh.bind_group, &[]);
                rpass.set_vertex_buffer(0, mesh.vbuf.slice(..));
                rpass.set_index_buffer(mesh.ibuf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.count, 0, 0..1);
            }
        }
        state.queue.submit(Some(encoder.finish()));
        frame.present();
        trace!(meshes = state.upload.meshes.len(), "frame presented");
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(state) = self.state.take() {
            state.destroy();
            info!("render surface disposed");
        }
    }
}

impl Drop for GpuSurface {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Surface extent for `size`, clamped to the device's texture limit.
fn surface_extent(size: ViewportSize, max_tex: u32) -> (u32, u32) {
    (
        size.width.min(max_tex).max(1),
        size.height.min(max_tex).max(1),
    )
}

/// Prefer an sRGB format so lighting stays linear.
fn pick_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_clamps_to_device_limit() {
        assert_eq!(surface_extent(ViewportSize::new(800, 600), 2048), (800, 600));
        assert_eq!(surface_extent(ViewportSize::new(5000, 600), 2048), (2048, 600));
    }

    #[test]
    fn format_prefers_srgb() {
        use wgpu::TextureFormat::{Bgra8Unorm, Bgra8UnormSrgb, Rgba16Float};
        assert_eq!(pick_format(&[Bgra8Unorm, Bgra8UnormSrgb]), Some(Bgra8UnormSrgb));
        assert_eq!(pick_format(&[Rgba16Float, Bgra8Unorm]), Some(Rgba16Float));
        assert_eq!(pick_format(&[]), None);
    }
}
