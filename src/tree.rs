//! Skeleton tree: one bone per tracked keypoint, retargeted onto incoming poses.
//!
//! ## Retargeting
//!
//! Pose keypoints are root-relative and normalized. For every bone the pass
//! maps its keypoint and its parent's keypoint into world space through the
//! root bone's current world matrix, takes the difference, and re-expresses
//! that offset in the parent bone's local frame. The bone's target
//! orientation turns local +Y onto the same offset, so each bone points from
//! its parent toward its own keypoint.

use glam::{Quat, Vec3};

use crate::bone::{InterpolatedBone, Smoothing};
use crate::channel::{PoseChannel, PoseSubscription};
use crate::error::RigError;
use crate::math::alignment_rotation;
use crate::pose::Pose;
use crate::scene::{NodeId, SceneGraph, Transform};
use crate::topology::{PoseType, Topology};

/// Rest offset of a freshly built bone, before any pose arrives
pub const REST_OFFSET: Vec3 = Vec3::new(0.0, 10.0, 0.0);

#[derive(Debug)]
pub struct SkeletonTree {
    pose_id: usize,
    should_align: bool,
    pose_type: PoseType,
    topology: &'static Topology,
    /// Parent keypoint per slot; `None` for the root and ignored slots
    keypoint_to_parent: Vec<Option<usize>>,
    /// Bone per slot; `None` for ignored slots
    bones: Vec<Option<InterpolatedBone>>,
    root: NodeId,
    scale: f32,
    target_pose: Option<Pose>,
    subscription: PoseSubscription,
}

impl SkeletonTree {
    /// Build the bone hierarchy for `pose_type` and subscribe to `channel`.
    ///
    /// The root bone is left detached; the caller hangs it wherever the tree
    /// should live in the scene.
    pub fn new(
        graph: &mut SceneGraph,
        channel: &mut PoseChannel,
        pose_type: PoseType,
        pose_id: usize,
        should_align: bool,
    ) -> Result<Self, RigError> {
        let topology = pose_type.topology();

        let mut bones: Vec<Option<InterpolatedBone>> = vec![None; topology.pose_size];
        for i in topology.bone_indices() {
            let node = graph.add_node(Transform::from_translation(REST_OFFSET));
            bones[i] = Some(InterpolatedBone::new(node));
        }

        let keypoint_to_parent = topology.parent_table();
        for (child, parent) in keypoint_to_parent.iter().enumerate() {
            let Some(parent) = *parent else { continue };
            let (Some(child_bone), Some(parent_bone)) = (&bones[child], &bones[parent]) else {
                return Err(RigError::Topology(format!(
                    "{}: limb link {} -> {} has no bone",
                    topology.name, parent, child
                )));
            };
            graph.attach(child_bone.node(), parent_bone.node())?;
        }

        let Some(root) = bones.first().and_then(Option::as_ref).map(InterpolatedBone::node) else {
            return Err(RigError::Topology(format!("{}: missing root bone", topology.name)));
        };

        Ok(Self {
            pose_id,
            should_align,
            pose_type,
            topology,
            keypoint_to_parent,
            bones,
            root,
            scale: 1.0,
            target_pose: None,
            subscription: channel.subscribe(),
        })
    }

    pub fn pose_id(&self) -> usize {
        self.pose_id
    }

    pub fn pose_type(&self) -> PoseType {
        self.pose_type
    }

    pub fn should_align(&self) -> bool {
        self.should_align
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Distance multiplier from normalized keypoints to scene units
    pub fn value_scalar(&self) -> f32 {
        self.pose_type.base_scalar() * self.scale
    }

    pub fn target_pose(&self) -> Option<&Pose> {
        self.target_pose.as_ref()
    }

    pub fn set_target(&mut self, pose: Pose) {
        self.target_pose = Some(pose);
    }

    pub fn parent_of(&self, keypoint: usize) -> Option<usize> {
        self.keypoint_to_parent.get(keypoint).copied().flatten()
    }

    /// Apply every batch delivered since the last poll.
    ///
    /// Batches without an entry for this tree's pose id are skipped; the tree
    /// keeps easing toward its last known target. Returns true if the target
    /// changed.
    pub fn poll_poses(&mut self) -> bool {
        let mut updated = false;
        for batch in self.subscription.drain() {
            if let Some(pose) = batch.get(self.pose_id) {
                self.target_pose = Some(pose.clone());
                updated = true;
            }
        }
        updated
    }

    /// Retarget toward the current target pose, if there is one
    pub fn update(&mut self, graph: &mut SceneGraph) {
        let Some(pose) = self.target_pose.take() else {
            return;
        };
        self.align(graph, &pose);
        self.target_pose = Some(pose);
    }

    /// Set every non-root bone's target from `pose`.
    pub fn align(&mut self, graph: &mut SceneGraph, pose: &Pose) {
        let root_world = graph.update_world_matrix(self.root());
        let align_rot = if self.should_align {
            alignment_rotation(pose.alignment_vector())
        } else {
            Quat::IDENTITY
        };
        let scalar = self.value_scalar();
        let to_world = |k: Vec3| root_world.transform_point3(align_rot * k * scalar);

        for i in 1..self.topology.pose_size {
            let Some(parent) = self.parent_of(i) else { continue };
            let Some(parent_node) = self.bones[parent].as_ref().map(|b| b.node()) else {
                continue;
            };
            let (Some(parent_key), Some(child_key)) = (pose.keypoint(parent), pose.keypoint(i))
            else {
                continue;
            };

            graph.update_world_matrix(parent_node);
            let parent_inv = graph.world_rotation(parent_node).inverse();

            let world_offset = to_world(child_key) - to_world(parent_key);

            let Some(bone) = self.bones[i].as_mut() else { continue };
            bone.set_target_position(parent_inv * world_offset);

            match world_offset.try_normalize() {
                Some(direction) => {
                    let rotation = Quat::from_rotation_arc(Vec3::Y, direction);
                    bone.set_target_orientation((parent_inv * rotation).normalize());
                }
                None => {
                    log::trace!("Keypoint {} coincides with its parent, keeping orientation", i);
                }
            }
        }
    }

    /// Advance every bone one tick; true if any bone is still moving
    pub fn advance(&self, graph: &mut SceneGraph, smoothing: &Smoothing) -> bool {
        let mut moving = false;
        for bone in self.bones() {
            moving |= bone.advance(graph, smoothing);
        }
        moving
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn bone(&self, keypoint: usize) -> Option<&InterpolatedBone> {
        self.bones.get(keypoint).and_then(Option::as_ref)
    }

    /// All live bones in keypoint order
    pub fn bones(&self) -> impl Iterator<Item = &InterpolatedBone> {
        self.bones.iter().flatten()
    }

    /// Keypoints that carry a bone, in ascending order
    pub fn bone_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|_| i))
    }

    /// Nodes of the limb tips that carry a bone
    pub fn ends(&self) -> Vec<NodeId> {
        self.topology
            .ends()
            .filter_map(|i| self.bone(i).map(InterpolatedBone::node))
            .collect()
    }

    /// One root-to-tip node chain per limb, for binding separate skins
    pub fn limb_chains(&self) -> Vec<Vec<NodeId>> {
        self.topology
            .limbs
            .iter()
            .map(|limb| {
                limb.iter()
                    .filter_map(|&i| self.bone(i).map(InterpolatedBone::node))
                    .collect()
            })
            .collect()
    }
}
