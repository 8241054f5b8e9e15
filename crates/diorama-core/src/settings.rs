// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene settings: asset location, camera, lights, model transform, loop policy.
//!
//! Settings are plain JSON blobs; every field has a default so hosts only
//! override what they need.

use diorama_scene::{
    AmbientLight, AssetSource, CameraRig, ColorRgb, DirectionalLight, Transform, ViewportSize,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for settings parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A value parsed but is outside its valid range.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// When the frame loop starts relative to the asset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPolicy {
    /// Start the loop only once the asset is attached.
    #[default]
    AfterLoad,
    /// Start the loop at activation, independent of the load.
    Immediate,
}

/// Complete configuration of one scene viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Location of the packed binary asset.
    pub asset: String,
    /// Loop start policy.
    pub loop_policy: LoopPolicy,
    /// Camera projection and pose.
    pub camera: CameraSettings,
    /// Fixed lights added at activation.
    pub lights: LightSettings,
    /// Fixed transform applied to the loaded model.
    pub model: ModelSettings,
    /// Background color (linear RGBA).
    pub clear_color: [f32; 4],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            asset: String::from("./assets/model/gaming_room.glb"),
            loop_policy: LoopPolicy::default(),
            camera: CameraSettings::default(),
            lights: LightSettings::default(),
            model: ModelSettings::default(),
            clear_color: [0.02, 0.02, 0.03, 1.0],
        }
    }
}

/// Camera projection and pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view (degrees).
    pub fov_y_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// World-space camera position.
    pub position: [f32; 3],
    /// World-space look-at target.
    pub target: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 50.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 2.0, 15.0],
            target: [0.0, 2.0, 0.0],
        }
    }
}

impl CameraSettings {
    /// Camera rig for a viewport of the given size.
    pub fn rig(&self, viewport: ViewportSize) -> CameraRig {
        let mut rig = CameraRig {
            fov_y_degrees: self.fov_y_degrees,
            near: self.near,
            far: self.far,
            position: Vec3::from(self.position),
            target: Vec3::from(self.target),
            ..CameraRig::default()
        };
        rig.set_viewport(viewport);
        rig
    }
}

/// Fixed lights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LightSettings {
    /// Ambient term.
    pub ambient: AmbientSettings,
    /// Directional term.
    pub directional: DirectionalSettings,
}

/// Ambient light parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientSettings {
    /// Light color.
    pub color: ColorRgb,
    /// Intensity multiplier.
    pub intensity: f32,
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 2.5,
        }
    }
}

/// Directional light parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalSettings {
    /// Light color.
    pub color: ColorRgb,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Travel direction; normalized when the light is built.
    pub direction: [f32; 3],
}

impl Default for DirectionalSettings {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            direction: [-0.5, -1.0, -0.5],
        }
    }
}

/// Transform applied to the loaded model root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Per-axis scale.
    pub scale: [f32; 3],
    /// World-space position.
    pub position: [f32; 3],
    /// XYZ Euler rotation (radians).
    pub rotation: [f32; 3],
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            scale: [4.0, 3.9, 4.0],
            position: [0.0, -5.0, 0.0],
            rotation: [0.0, -core::f32::consts::PI / 3.5, 0.0],
        }
    }
}

impl ModelSettings {
    /// Transform for the model root.
    pub fn transform(&self) -> Transform {
        Transform::from_scale_position_euler(
            Vec3::from(self.scale),
            Vec3::from(self.position),
            Vec3::from(self.rotation),
        )
    }
}

impl SceneSettings {
    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_slice(bytes)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.fov_y_degrees > 0.0 && cam.fov_y_degrees < 180.0) {
            return Err(invalid("camera.fov_y_degrees", "must be in (0, 180)"));
        }
        if !(cam.near > 0.0 && cam.far > cam.near && cam.far.is_finite()) {
            return Err(invalid("camera.near", "requires 0 < near < far"));
        }
        if Vec3::from(cam.position) == Vec3::from(cam.target) {
            return Err(invalid("camera.target", "must differ from camera.position"));
        }
        let scale = Vec3::from(self.model.scale);
        if !scale.is_finite() || scale.abs().min_element() == 0.0 {
            return Err(invalid("model.scale", "components must be finite and non-zero"));
        }
        if !Vec3::from(self.model.position).is_finite()
            || !Vec3::from(self.model.rotation).is_finite()
        {
            return Err(invalid("model", "position and rotation must be finite"));
        }
        if Vec3::from(self.lights.directional.direction)
            .try_normalize()
            .is_none()
        {
            return Err(invalid("lights.directional.direction", "must be non-zero"));
        }
        if self.asset.trim().is_empty() {
            return Err(invalid("asset", "must not be empty"));
        }
        Ok(())
    }

    /// Asset to request at activation.
    pub fn asset_source(&self) -> AssetSource {
        AssetSource(self.asset.clone())
    }

    /// Ambient light built from settings.
    pub fn ambient_light(&self) -> AmbientLight {
        AmbientLight {
            color: self.lights.ambient.color,
            intensity: self.lights.ambient.intensity,
        }
    }

    /// Directional light built from settings.
    pub fn directional_light(&self) -> DirectionalLight {
        let d = &self.lights.directional;
        DirectionalLight::new(d.color, d.intensity, Vec3::from(d.direction))
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
