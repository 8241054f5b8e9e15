// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GPU-side layouts and scene uploads.

use std::collections::HashMap;
use std::sync::Arc;

use diorama_scene::{CameraRig, Mesh, SceneGraph, Texture};
use glam::Mat4;
use tracing::warn;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
}

impl Globals {
    pub fn new(scene: &SceneGraph, camera: &CameraRig) -> Self {
        let [r, g, b] = scene.ambient();
        let (light_dir, light_color) = match scene.directional() {
            Some(d) => {
                let dir = d.direction();
                let c = d.color;
                (
                    [dir.x, dir.y, dir.z, 0.0],
                    [c[0] * d.intensity, c[1] * d.intensity, c[2] * d.intensity, 0.0],
                )
            }
            None => ([0.0, -1.0, 0.0, 0.0], [0.0; 4]),
        };
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            ambient: [r, g, b, 0.0],
            light_dir,
            light_color,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct ModelUniform {
    pub world: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub base_color: [f32; 4],
}

impl ModelUniform {
    pub fn new(world: Mat4, base_color: [f32; 4]) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            base_color,
        }
    }
}

/// Interleave mesh attributes; missing normals or UVs are zero-filled.
pub(crate) fn interleave(mesh: &Mesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| Vertex {
            pos,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect()
}

/// One uploaded mesh instance, ready to draw.
pub(crate) struct GpuMesh {
    pub vbuf: wgpu::Buffer,
    pub ibuf: wgpu::Buffer,
    pub ubuf: wgpu::Buffer,
    pub count: u32,
    pub double_sided: bool,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    fn destroy(&self) {
        self.vbuf.destroy();
        self.ibuf.destroy();
        self.ubuf.destroy();
    }
}

/// Everything uploaded for one scene revision.
pub(crate) struct SceneUpload {
    pub revision: u64,
    pub meshes: Vec<GpuMesh>,
    textures: HashMap<usize, wgpu::Texture>,
}

impl SceneUpload {
    pub fn empty() -> Self {
        Self {
            revision: u64::MAX,
            meshes: Vec::new(),
            textures: HashMap::new(),
        }
    }

    pub fn destroy(&mut self) {
        for mesh in self.meshes.drain(..) {
            mesh.destroy();
        }
        for (_, texture) in self.textures.drain() {
            texture.destroy();
        }
    }
}

/// Resources shared by every mesh bind group.
pub(crate) struct UploadContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub layout: &'a wgpu::BindGroupLayout,
    pub sampler: &'a wgpu::Sampler,
    pub white: &'a wgpu::TextureView,
    pub max_texture_dimension: u32,
}

/// Upload every mesh of `scene`, reusing nothing from earlier revisions.
pub(crate) fn upload_scene(ctx: &UploadContext<'_>, scene: &SceneGraph) -> SceneUpload {
    let mut upload = SceneUpload {
        revision: scene.revision(),
        meshes: Vec::with_capacity(scene.mesh_count()),
        textures: HashMap::new(),
    };
    scene.visit_meshes(|world, mesh| {
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            return;
        }
        let view = mesh
            .material
            .base_color_texture
            .as_ref()
            .and_then(|tex| texture_view(ctx, &mut upload.textures, tex));
        let gpu = upload_mesh(ctx, world, mesh, view.as_ref().unwrap_or(ctx.white));
        upload.meshes.push(gpu);
    });
    upload
}

/// Textures are keyed by allocation so shared images upload once.
fn texture_view(
    ctx: &UploadContext<'_>,
    cache: &mut HashMap<usize, wgpu::Texture>,
    texture: &Arc<Texture>,
) -> Option<wgpu::TextureView> {
    if !is_well_formed(texture) {
        warn!(
            width = texture.width,
            height = texture.height,
            bytes = texture.rgba.len(),
            "texture size mismatch; falling back to white"
        );
        return None;
    }
    if !fits_device(texture, ctx.max_texture_dimension) {
        warn!(
            width = texture.width,
            height = texture.height,
            limit = ctx.max_texture_dimension,
            "texture exceeds device limit; falling back to white"
        );
        return None;
    }
    let view = cache
        .entry(Arc::as_ptr(texture) as usize)
        .or_insert_with(|| create_rgba_texture(ctx.device, ctx.queue, "base_color", texture))
        .create_view(&wgpu::TextureViewDescriptor::default());
    Some(view)
}

fn is_well_formed(texture: &Texture) -> bool {
    texture.width > 0
        && texture.height > 0
        && texture.rgba.len() == texture.width as usize * texture.height as usize * 4
}

fn fits_device(texture: &Texture, max_dimension: u32) -> bool {
    texture.width <= max_dimension && texture.height <= max_dimension
}

fn upload_mesh(
    ctx: &UploadContext<'_>,
    world: Mat4,
    mesh: &Mesh,
    base_color: &wgpu::TextureView,
) -> GpuMesh {
    let vertices = interleave(mesh);
    let vbuf = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vb"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
    let ibuf = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_ib"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
    let uniform = ModelUniform::new(world, mesh.material.base_color);
    let ubuf = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_model"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("mesh_bg"),
        layout: ctx.layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: ubuf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(base_color),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(ctx.sampler),
            },
        ],
    });
    GpuMesh {
        vbuf,
        ibuf,
        ubuf,
        count: mesh.indices.len() as u32,
        double_sided: mesh.material.double_sided,
        bind_group,
    }
}

pub(crate) fn create_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    texture: &Texture,
) -> wgpu::Texture {
    device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: texture.width.max(1),
                height: texture.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &texture.rgba,
    )
}
