// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoding hand-assembled GLB containers.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use diorama_gltf::{decode_glb, DecodeError};
use diorama_scene::LoadError;
use glam::Vec3;

/// Assemble a GLB container from a JSON document and a binary chunk.
fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let bin_chunk = if bin.is_empty() { 0 } else { 8 + bin.len() };
    let total = 12 + 8 + json.len() + bin_chunk;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
    }
    out
}

/// Three `VEC3` positions followed by three `u16` indices.
fn triangle_bin() -> Vec<u8> {
    let mut bin = Vec::new();
    for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in v {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin
}

fn triangle_json(mode: u32, indexed: bool) -> String {
    let indices = if indexed { r#","indices":1"# } else { "" };
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "name": "room", "nodes": [0] }}],
  "nodes": [{{ "name": "desk", "mesh": 0, "translation": [1.0, 2.0, 3.0] }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}{indices}, "material": 0, "mode": {mode} }}] }}],
  "materials": [{{ "name": "red", "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }}, "doubleSided": true }}],
  "buffers": [{{ "byteLength": 44 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#
    )
}

#[test]
fn decodes_single_triangle() {
    let root = decode_glb(&glb(&triangle_json(4, true), &triangle_bin())).expect("decode");
    assert_eq!(root.name.as_deref(), Some("room"));
    assert_eq!(root.mesh_count(), 1);

    let desk = &root.children[0];
    assert_eq!(desk.name.as_deref(), Some("desk"));
    assert_eq!(desk.transform.translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(desk.transform.scale, Vec3::ONE);

    let mesh = &desk.meshes[0];
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
    assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
    assert!(mesh.uvs.is_empty());
    assert_eq!(mesh.material.name.as_deref(), Some("red"));
    assert_eq!(mesh.material.base_color, [1.0, 0.0, 0.0, 1.0]);
    assert!(mesh.material.double_sided);
    assert!(mesh.material.base_color_texture.is_none());
}

#[test]
fn unindexed_primitive_gets_sequential_indices() {
    let root = decode_glb(&glb(&triangle_json(4, false), &triangle_bin())).expect("decode");
    assert_eq!(root.children[0].meshes[0].indices, vec![0, 1, 2]);
}

#[test]
fn point_primitives_are_not_geometry() {
    let err = decode_glb(&glb(&triangle_json(0, false), &triangle_bin())).expect_err("points");
    assert!(matches!(err, DecodeError::NoGeometry));
}

#[test]
fn scene_without_meshes_has_no_geometry() {
    let json = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "empty" }]
}"#;
    let err = decode_glb(&glb(json, &[])).expect_err("empty");
    assert!(matches!(err, DecodeError::NoGeometry));
}

#[test]
fn asset_without_scenes_is_rejected() {
    let json = r#"{ "asset": { "version": "2.0" } }"#;
    let err = decode_glb(&glb(json, &[])).expect_err("no scene");
    assert!(matches!(err, DecodeError::NoScene));
}

#[test]
fn garbage_is_a_gltf_error() {
    let err = decode_glb(b"definitely not a glb").expect_err("garbage");
    assert!(matches!(err, DecodeError::Gltf(_)));
}

#[test]
fn decode_error_becomes_load_error() {
    let load: LoadError = DecodeError::NoGeometry.into();
    assert_eq!(
        load,
        LoadError::Decode("asset contains no triangle geometry".into())
    );
}
