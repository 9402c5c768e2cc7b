//! Keypoint topology registry.
//!
//! Describes which keypoints of a detector layout get a bone, how those bones
//! chain into limbs, and which keypoints terminate a limb.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::topology_tables::*;

/// Detector layout a rig is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseType {
    Hand,
    Body,
}

impl PoseType {
    /// Static topology for this layout
    pub fn topology(self) -> &'static Topology {
        match self {
            PoseType::Hand => &HAND_TOPOLOGY,
            PoseType::Body => &BODY_TOPOLOGY,
        }
    }

    /// Multiplier from normalized detector units to scene units
    pub fn base_scalar(self) -> f32 {
        self.topology().base_scalar
    }
}

impl FromStr for PoseType {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hand" => Ok(PoseType::Hand),
            "body" => Ok(PoseType::Body),
            other => Err(RigError::UnknownPoseType(other.to_string())),
        }
    }
}

impl fmt::Display for PoseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseType::Hand => f.write_str("hand"),
            PoseType::Body => f.write_str("body"),
        }
    }
}

/// Immutable description of one keypoint layout.
#[derive(Debug)]
pub struct Topology {
    pub name: &'static str,
    /// Total keypoint slots delivered by the detector
    pub pose_size: usize,
    /// Keypoints that never get a bone
    pub ignored_indices: &'static [usize],
    /// Root-to-tip keypoint chains
    pub limbs: &'static [&'static [usize]],
    /// Tip keypoints; may name ignored indices, see [`Topology::ends`]
    pub end_indices: &'static [usize],
    pub base_scalar: f32,
}

pub static BODY_TOPOLOGY: Topology = Topology {
    name: "body",
    pose_size: BODYPOSE_SIZE,
    ignored_indices: BODYPOSE_IGNORED_INDICES,
    limbs: BODYPOSE_LIMBS,
    end_indices: BODYPOSE_END_INDICES,
    base_scalar: BODYPOSE_BASE_SCALAR,
};

pub static HAND_TOPOLOGY: Topology = Topology {
    name: "hand",
    pose_size: HANDPOSE_SIZE,
    ignored_indices: HANDPOSE_IGNORED_INDICES,
    limbs: HANDPOSE_LIMBS,
    end_indices: HANDPOSE_END_INDICES,
    base_scalar: HANDPOSE_BASE_SCALAR,
};

impl Topology {
    /// Run the table invariants; a failure here means the rig must not start.
    pub fn validate(&self) -> Result<(), RigError> {
        validate_tables(
            self.name,
            self.pose_size,
            self.limbs,
            self.ignored_indices,
            self.end_indices,
        )
        .map(|_| ())
        .map_err(RigError::Topology)
    }

    #[inline]
    pub fn is_ignored(&self, index: usize) -> bool {
        self.ignored_indices.contains(&index)
    }

    /// Keypoints that get a bone, in ascending (topological) order
    pub fn bone_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.pose_size).filter(move |&i| !self.is_ignored(i))
    }

    /// Parent keypoint for every slot, derived from the limb chains.
    /// The root and ignored slots map to `None`.
    pub fn parent_table(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.pose_size];
        for limb in self.limbs {
            for pair in limb.windows(2) {
                parents[pair[1]] = Some(pair[0]);
            }
        }
        parents
    }

    /// End keypoints that actually carry a bone
    pub fn ends(&self) -> impl Iterator<Item = usize> + '_ {
        self.end_indices
            .iter()
            .copied()
            .filter(move |&i| i < self.pose_size && !self.is_ignored(i))
    }

    /// Bones per limb chain, which is also the bone count of a skinned tube
    pub fn skin_bone_count(&self) -> usize {
        self.limbs.first().map_or(0, |limb| limb.len())
    }
}
