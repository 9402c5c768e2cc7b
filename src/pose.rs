//! Detected pose samples as delivered by the pose detector.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One detected keypoint, root-relative, in normalized detector units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            confidence: None,
        }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Keypoint {
    fn from(v: Vec3) -> Self {
        Keypoint::new(v.x, v.y, v.z)
    }
}

/// A single pose sample.
///
/// Only the 3D keypoints and the alignment vector feed the retargeting; the
/// remaining fields belong to the detector and are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(rename = "keypoints3D")]
    pub keypoints_3d: Vec<Keypoint>,

    /// Average direction from the root to all other keypoints.
    /// Computed from the keypoints when the detector leaves it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_vector: Option<Vec3>,
}

impl Pose {
    /// Build a pose from raw keypoints, filling in the alignment vector
    pub fn from_keypoints(keypoints: impl IntoIterator<Item = Vec3>) -> Self {
        let keypoints_3d: Vec<Keypoint> = keypoints.into_iter().map(Keypoint::from).collect();
        let alignment_vector = Some(average_direction(&keypoints_3d));
        Self {
            id: None,
            confidence: None,
            keypoints_3d,
            alignment_vector,
        }
    }

    /// Keypoint position for a slot, if the detector delivered it
    #[inline]
    pub fn keypoint(&self, index: usize) -> Option<Vec3> {
        self.keypoints_3d.get(index).map(|k| k.to_vec3())
    }

    pub fn alignment_vector(&self) -> Vec3 {
        self.alignment_vector
            .unwrap_or_else(|| average_direction(&self.keypoints_3d))
    }
}

/// Normalized sum of the offsets from keypoint 0 to every other keypoint.
/// Zero when the pose is empty or the offsets cancel out.
fn average_direction(keypoints: &[Keypoint]) -> Vec3 {
    let Some((root, rest)) = keypoints.split_first() else {
        return Vec3::ZERO;
    };
    let root = root.to_vec3();
    rest.iter()
        .map(|k| k.to_vec3() - root)
        .sum::<Vec3>()
        .normalize_or_zero()
}
