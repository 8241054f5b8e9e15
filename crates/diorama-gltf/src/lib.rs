// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packed binary glTF (`.glb`) decoding into a Diorama [`SceneNode`].
//!
//! Buffers and images must be embedded; external URIs are not resolved. The
//! decoded tree mirrors the asset's default scene: the returned node has one
//! child per scene root, each carrying its local transform.

use std::collections::HashMap;
use std::sync::Arc;

use diorama_scene::{LoadError, Material, Mesh, SceneNode, Texture, Transform};
use glam::{Quat, Vec3};
use gltf::image::Format;
use gltf::mesh::Mode;
use thiserror::Error;
use tracing::{debug, warn};

/// Decoder failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The container or JSON document is malformed.
    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),
    /// The asset declares no scene.
    #[error("asset contains no scene")]
    NoScene,
    /// The default scene has no triangle geometry.
    #[error("asset contains no triangle geometry")]
    NoGeometry,
    /// A triangle primitive lacks the `POSITION` attribute.
    #[error("mesh {mesh} primitive {primitive} has no positions")]
    MissingPositions {
        /// Mesh index in the document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
    },
}

impl From<DecodeError> for LoadError {
    fn from(err: DecodeError) -> Self {
        LoadError::Decode(err.to_string())
    }
}

/// Decode a `.glb` byte buffer.
pub fn decode_glb(bytes: &[u8]) -> Result<SceneNode, DecodeError> {
    let (document, buffers, images) = gltf::import_slice(bytes)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(DecodeError::NoScene)?;

    let mut decoder = Decoder {
        buffers: &buffers,
        images: &images,
        textures: HashMap::new(),
    };
    let mut root = SceneNode {
        name: scene.name().map(str::to_owned),
        ..SceneNode::default()
    };
    for node in scene.nodes() {
        root.children.push(decoder.node(&node)?);
    }
    if root.mesh_count() == 0 {
        return Err(DecodeError::NoGeometry);
    }
    debug!(
        meshes = root.mesh_count(),
        textures = decoder.textures.len(),
        "decoded glb"
    );
    Ok(root)
}

struct Decoder<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    textures: HashMap<usize, Option<Arc<Texture>>>,
}

impl Decoder<'_> {
    fn node(&mut self, node: &gltf::Node<'_>) -> Result<SceneNode, DecodeError> {
        let (translation, rotation, scale) = node.transform().decomposed();
        let mut out = SceneNode {
            name: node.name().map(str::to_owned),
            transform: Transform {
                translation: Vec3::from(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from(scale),
            },
            ..SceneNode::default()
        };
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if let Some(decoded) = self.primitive(&mesh, &primitive)? {
                    out.meshes.push(decoded);
                }
            }
        }
        for child in node.children() {
            out.children.push(self.node(&child)?);
        }
        Ok(out)
    }

    fn primitive(
        &mut self,
        mesh: &gltf::Mesh<'_>,
        primitive: &gltf::Primitive<'_>,
    ) -> Result<Option<Mesh>, DecodeError> {
        if primitive.mode() != Mode::Triangles {
            debug!(mesh = mesh.index(), mode = ?primitive.mode(), "skipping non-triangle primitive");
            return Ok(None);
        }
        let buffers = self.buffers;
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(DecodeError::MissingPositions {
                mesh: mesh.index(),
                primitive: primitive.index(),
            })?
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            #[allow(clippy::cast_possible_truncation)]
            None => (0..positions.len() as u32).collect(),
        };
        let normals = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => compute_normals(&positions, &indices),
        };

        let material = primitive.material();
        let pbr = material.pbr_metallic_roughness();
        let texture_info = pbr.base_color_texture();
        let uv_set = texture_info.as_ref().map_or(0, |info| info.tex_coord());
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(uv_set)
            .map(|tc| tc.into_f32().collect())
            .unwrap_or_default();
        let base_color_texture = texture_info
            .and_then(|info| self.texture(info.texture().source().index()));

        Ok(Some(Mesh {
            positions,
            normals,
            uvs,
            indices,
            material: Material {
                name: material.name().map(str::to_owned),
                base_color: pbr.base_color_factor(),
                base_color_texture,
                double_sided: material.double_sided(),
            },
        }))
    }

    /// Materials referencing the same image share one texture.
    fn texture(&mut self, image: usize) -> Option<Arc<Texture>> {
        if let Some(cached) = self.textures.get(&image) {
            return cached.clone();
        }
        let texture = self.images.get(image).and_then(|data| {
            let rgba = to_rgba8(data.format, &data.pixels);
            if rgba.is_none() {
                warn!(image, format = ?data.format, "unsupported texture format; using base color only");
            }
            rgba.map(|rgba| {
                Arc::new(Texture {
                    width: data.width,
                    height: data.height,
                    rgba,
                })
            })
        });
        self.textures.insert(image, texture.clone());
        texture
    }
}

/// Expand 8-bit pixel data to RGBA8. Higher bit depths are not supported.
fn to_rgba8(format: Format, pixels: &[u8]) -> Option<Vec<u8>> {
    let rgba = match format {
        Format::R8G8B8A8 => pixels.to_vec(),
        Format::R8G8B8 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        _ => return None,
    };
    Some(rgba)
}

/// Area-weighted vertex normals; degenerate vertices point up.
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(pa), Some(pb), Some(pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}
