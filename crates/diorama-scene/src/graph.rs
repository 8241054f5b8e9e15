// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene graph: lights plus a forest of transformed nodes.

use glam::Mat4;

use crate::{AmbientLight, DirectionalLight, Light, Mesh, Transform};

/// A node with a local transform, its own meshes and child nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    /// Node name from the asset, if any.
    pub name: Option<String>,
    /// Transform relative to the parent node.
    pub transform: Transform,
    /// Meshes drawn with this node's world matrix.
    pub meshes: Vec<Mesh>,
    /// Child nodes.
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Empty node with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Total number of meshes in this subtree.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len() + self.children.iter().map(Self::mesh_count).sum::<usize>()
    }

    /// Visit every mesh in this subtree with its world matrix.
    pub fn visit_meshes<'a>(&'a self, parent: Mat4, visit: &mut impl FnMut(Mat4, &'a Mesh)) {
        let world = parent * self.transform.matrix();
        for mesh in &self.meshes {
            visit(world, mesh);
        }
        for child in &self.children {
            child.visit_meshes(world, visit);
        }
    }
}

/// Lights and top-level nodes composited into a frame.
///
/// Every mutation bumps [`SceneGraph::revision`] so renderers can cache uploads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneGraph {
    lights: Vec<Light>,
    nodes: Vec<SceneNode>,
    revision: u64,
}

impl SceneGraph {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a light source.
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
        self.revision += 1;
    }

    /// Insert a top-level node.
    pub fn insert_node(&mut self, node: SceneNode) {
        self.nodes.push(node);
        self.revision += 1;
    }

    /// All light sources in insertion order.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Top-level nodes in insertion order.
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sum of all ambient lights, color pre-multiplied by intensity.
    pub fn ambient(&self) -> [f32; 3] {
        self.lights
            .iter()
            .filter_map(|l| match l {
                Light::Ambient(AmbientLight { color, intensity }) => {
                    Some([color[0] * intensity, color[1] * intensity, color[2] * intensity])
                }
                Light::Directional(_) => None,
            })
            .fold([0.0; 3], |acc, c| [acc[0] + c[0], acc[1] + c[1], acc[2] + c[2]])
    }

    /// First directional light, if any.
    pub fn directional(&self) -> Option<&DirectionalLight> {
        self.lights.iter().find_map(|l| match l {
            Light::Directional(d) => Some(d),
            Light::Ambient(_) => None,
        })
    }

    /// Visit every mesh in the scene with its world matrix.
    pub fn visit_meshes<'a>(&'a self, mut visit: impl FnMut(Mat4, &'a Mesh)) {
        for node in &self.nodes {
            node.visit_meshes(Mat4::IDENTITY, &mut visit);
        }
    }

    /// Total number of meshes in the scene.
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().map(SceneNode::mesh_count).sum()
    }
}
