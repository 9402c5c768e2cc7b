//! Pose Tree - Wasm Core
//!
//! Retargets streamed body/hand keypoint poses onto procedurally built bone
//! trees, eases the bones toward each new target and skins tapered tubes onto
//! every limb chain. Trees can be nested on each other's endpoints.

pub mod bone;
pub mod channel;
pub mod config;
pub mod error;
pub mod fractal;
mod math;
pub mod pose;
pub mod rig;
pub mod scene;
pub mod skin;
pub mod topology;
mod topology_tables;
pub mod tree;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bone::{InterpolatedBone, Smoothing};
pub use channel::{POSES_TOPIC, PoseBatch, PoseChannel, PoseSubscription};
pub use config::RigConfig;
pub use error::RigError;
pub use math::{Mat4, Quat, Vec3};
pub use pose::{Keypoint, Pose};
pub use rig::{Rig, TOP_TREE, TreeId};
pub use scene::{NodeId, SceneGraph, Transform};
pub use skin::{SkinMeshCache, SkinnedLimb, SkinnedVertex, TubeMesh, TubeParams};
pub use topology::{PoseType, Topology};
pub use tree::SkeletonTree;

#[cfg(target_arch = "wasm32")]
pub use web::{WebRig, init_logging};
