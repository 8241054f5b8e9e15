// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera rig: perspective projection kept in sync with the viewport.

use glam::{Mat4, Vec3};

use crate::ViewportSize;

/// Perspective camera looking at a fixed target.
///
/// The aspect ratio is owned by the viewport: it is only changed through
/// [`CameraRig::set_viewport`], which every resize goes through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Viewport width divided by height.
    pub aspect: f32,
    /// Near clipping plane.
    ///
    /// Values < 0.1 may cause depth buffer precision issues.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Camera position in world space.
    pub position: Vec3,
    /// Look-at target in world space.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 50.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 2.0, 15.0),
            target: Vec3::new(0.0, 2.0, 0.0),
            up: Vec3::Y,
        }
    }
}

impl CameraRig {
    /// Recompute the aspect ratio for a new viewport size.
    ///
    /// Collapsed sizes are ignored so the projection never degenerates.
    pub fn set_viewport(&mut self, size: ViewportSize) {
        if size.is_empty() {
            return;
        }
        self.aspect = size.aspect();
    }

    /// World-to-view matrix.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View-to-clip matrix (`wgpu` depth range).
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Combined world-to-clip matrix.
    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
