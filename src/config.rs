//! Rig configuration.
//!
//! Parsed once at startup from JSON (or a JS object in the browser). A bad
//! value aborts construction: the pose type in particular decides bone counts
//! and every index mapping, so there is no safe default to fall back on.

use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::topology::PoseType;

fn default_scale_factor() -> f32 {
    0.5
}

fn default_lerp_factor() -> f32 {
    0.1
}

fn default_fractal_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RigConfig {
    /// Detector layout; selects topology, base scalar and skin bone count
    pub pose_type: PoseType,

    /// Per-level shrink for nested trees, also the tube taper
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,

    /// Blend rate per tick, in (0, 1]
    #[serde(default = "default_lerp_factor")]
    pub lerp_factor: f32,

    /// Whether the top-level tree re-orients poses onto +Y
    #[serde(default)]
    pub align_all_poses_up: bool,

    /// Depth of nested trees hung off every endpoint
    #[serde(default = "default_fractal_level")]
    pub fractal_level: u32,

    /// Skip binding tube meshes to the limb chains
    #[serde(default)]
    pub hide_mesh: bool,

    #[serde(default)]
    pub debug_mode: bool,
}

impl RigConfig {
    /// Config with defaults for everything but the pose type
    pub fn new(pose_type: PoseType) -> Self {
        Self {
            pose_type,
            scale_factor: default_scale_factor(),
            lerp_factor: default_lerp_factor(),
            align_all_poses_up: false,
            fractal_level: default_fractal_level(),
            hide_mesh: false,
            debug_mode: false,
        }
    }

    /// Parse and validate from a JSON string
    pub fn from_json(json: &str) -> Result<Self, RigError> {
        let config: RigConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RigError> {
        if !(self.lerp_factor > 0.0 && self.lerp_factor <= 1.0) {
            return Err(RigError::Config(format!(
                "lerpFactor must be in (0, 1], got {}",
                self.lerp_factor
            )));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(RigError::Config(format!(
                "scaleFactor must be a positive number, got {}",
                self.scale_factor
            )));
        }
        self.pose_type.topology().validate()
    }
}
