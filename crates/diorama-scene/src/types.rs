// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core value types for the rendering port contract.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Linear RGB color with `f32` components in `[0, 1]`.
pub type ColorRgb = [f32; 3];

/// Size of the host viewport in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ViewportSize {
    /// Create a size from pixel dimensions.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (hidden or collapsed element).
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height.
    ///
    /// Only meaningful for non-empty sizes; callers check [`Self::is_empty`] first.
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Local transform of a scene node: scale, then rotate, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation in parent space.
    pub translation: Vec3,
    /// Orientation in parent space.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Build a transform from scale, position and XYZ Euler angles in radians.
    pub fn from_scale_position_euler(scale: Vec3, position: Vec3, euler_xyz: Vec3) -> Self {
        Self {
            translation: position,
            rotation: Quat::from_euler(EulerRot::XYZ, euler_xyz.x, euler_xyz.y, euler_xyz.z),
            scale,
        }
    }

    /// Affine matrix equivalent to this transform.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Token for one pending display-frame notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(pub u64);

/// Token for an active resize notification stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResizeSubscription(pub u64);

/// Identifies the activation that issued a load request.
///
/// Load results are only accepted by the activation whose ticket they carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    activation: u64,
}

impl LoadTicket {
    /// Create a ticket for the given activation number.
    pub const fn new(activation: u64) -> Self {
        Self { activation }
    }

    /// Activation number this ticket belongs to.
    pub const fn activation(self) -> u64 {
        self.activation
    }
}

/// Location of a packed binary scene asset (URL or relative path).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetSource(pub String);

impl AssetSource {
    /// Borrow the location string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetSource {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// One asynchronous fetch-and-decode of the external asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    /// Ticket to hand back with the result.
    pub ticket: LoadTicket,
    /// Asset to fetch.
    pub source: AssetSource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f32::consts::FRAC_PI_2;

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(ViewportSize::new(800, 600).aspect(), 800.0 / 600.0);
        assert!(ViewportSize::new(0, 600).is_empty());
        assert!(ViewportSize::new(800, 0).is_empty());
        assert!(!ViewportSize::new(1, 1).is_empty());
    }

    #[test]
    fn transform_matrix_scales_rotates_then_translates() {
        let t = Transform::from_scale_position_euler(
            Vec3::splat(2.0),
            Vec3::new(0.0, -5.0, 0.0),
            Vec3::new(0.0, FRAC_PI_2, 0.0),
        );
        let p = t.matrix().transform_point3(Vec3::X);
        // +X scaled to 2, yawed a quarter turn onto -Z, then dropped 5 units.
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, -5.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-5);
    }
}
