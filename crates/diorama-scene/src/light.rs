// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Light sources.

use glam::Vec3;

use crate::ColorRgb;

/// Uniform light reaching every surface equally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    /// Light color.
    pub color: ColorRgb,
    /// Scalar multiplier on `color`.
    pub intensity: f32,
}

/// Parallel light travelling along a fixed direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Light color.
    pub color: ColorRgb,
    /// Scalar multiplier on `color`.
    pub intensity: f32,
    direction: Vec3,
}

impl DirectionalLight {
    /// Create a directional light; `direction` is normalized.
    ///
    /// A zero or non-finite direction falls back to straight down.
    pub fn new(color: ColorRgb, intensity: f32, direction: Vec3) -> Self {
        Self {
            color,
            intensity,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
        }
    }

    /// Unit vector the light travels along.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }
}

/// A light source in the scene graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    /// Ambient term.
    Ambient(AmbientLight),
    /// Directional term.
    Directional(DirectionalLight),
}
