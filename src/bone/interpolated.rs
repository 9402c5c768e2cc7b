use glam::{Quat, Vec3};

use super::smoothing::Smoothing;
use crate::scene::{NodeId, SceneGraph};

/// A bone that eases its scene node toward a target local transform.
///
/// The bone does not own its transform; it holds a handle into the scene
/// graph. Targets are written by the retarget pass and consumed by
/// [`InterpolatedBone::advance`] every tick, whether or not a new pose arrived.
#[derive(Debug, Clone)]
pub struct InterpolatedBone {
    node: NodeId,
    target_position: Option<Vec3>,
    target_orientation: Option<Quat>,
}

impl InterpolatedBone {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            target_position: None,
            target_orientation: None,
        }
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn target_position(&self) -> Option<Vec3> {
        self.target_position
    }

    pub fn target_orientation(&self) -> Option<Quat> {
        self.target_orientation
    }

    pub fn set_target_position(&mut self, position: Vec3) {
        self.target_position = Some(position);
    }

    pub fn set_target_orientation(&mut self, orientation: Quat) {
        self.target_orientation = Some(orientation);
    }

    /// Move one step toward the targets.
    ///
    /// Each channel blends while the gap is above its snap threshold and
    /// otherwise copies the target exactly. Returns true if either channel
    /// blended (i.e. the bone is still in motion).
    pub fn advance(&self, graph: &mut SceneGraph, smoothing: &Smoothing) -> bool {
        let mut moving = false;
        let local = *graph.local(self.node);

        if let Some(target) = self.target_position {
            if local.translation.distance(target) >= smoothing.position_snap {
                graph.set_translation(
                    self.node,
                    local.translation.lerp(target, smoothing.lerp_factor),
                );
                moving = true;
            } else if local.translation != target {
                graph.set_translation(self.node, target);
            }
        }

        if let Some(target) = self.target_orientation {
            if local.rotation.angle_between(target) > smoothing.orientation_snap {
                graph.set_rotation(
                    self.node,
                    local.rotation.slerp(target, smoothing.lerp_factor),
                );
                moving = true;
            } else if local.rotation != target {
                graph.set_rotation(self.node, target);
            }
        }

        moving
    }
}
