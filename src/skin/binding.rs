//! Binding a tube mesh to a chain of bones.
//!
//! The mesh lives in the space of the tree root's parent. Inverse bind
//! matrices are captured once from the bones' world matrices at bind time;
//! each frame the joint matrices carry bind-pose vertices to where the bones
//! are now, expressed in the mesh's current space. Moving the anchor alone
//! leaves every joint matrix at identity.

use glam::{Mat4, Vec3};

use super::tube::TubeMesh;
use crate::scene::{NodeId, SceneGraph};

#[derive(Debug, Clone)]
pub struct SkinnedLimb {
    bones: Vec<NodeId>,
    mesh: TubeMesh,
    /// Node the mesh is parented to; `None` places it at the scene origin
    anchor: Option<NodeId>,
    bind_matrix: Mat4,
    inverse_bind: Vec<Mat4>,
}

impl SkinnedLimb {
    /// Bind `mesh` to `bones` in their current pose.
    ///
    /// Joint slots in the mesh index into `bones`.
    pub fn bind(
        graph: &mut SceneGraph,
        bones: Vec<NodeId>,
        mesh: TubeMesh,
        anchor: Option<NodeId>,
    ) -> Self {
        let bind_matrix = anchor.map_or(Mat4::IDENTITY, |a| graph.world_matrix(a));
        let inverse_bind = bones
            .iter()
            .map(|&b| graph.world_matrix(b).inverse())
            .collect();

        if mesh.bone_count > bones.len() {
            log::warn!(
                "Tube skinned for {} bones bound to a chain of {}",
                mesh.bone_count,
                bones.len()
            );
        }

        Self {
            bones,
            mesh,
            anchor,
            bind_matrix,
            inverse_bind,
        }
    }

    pub fn bones(&self) -> &[NodeId] {
        &self.bones
    }

    pub fn mesh(&self) -> &TubeMesh {
        &self.mesh
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    /// Current world matrix of the mesh
    pub fn mesh_world(&self, graph: &mut SceneGraph) -> Mat4 {
        self.anchor.map_or(Mat4::IDENTITY, |a| graph.world_matrix(a))
    }

    /// Per-joint skinning matrices in mesh space, one per bone
    pub fn joint_matrices(&self, graph: &mut SceneGraph) -> Vec<Mat4> {
        let mesh_world_inverse = self.mesh_world(graph).inverse();
        self.bones
            .iter()
            .zip(&self.inverse_bind)
            .map(|(&bone, inverse)| {
                mesh_world_inverse * graph.world_matrix(bone) * *inverse * self.bind_matrix
            })
            .collect()
    }

    /// Deformed vertex positions in world space
    pub fn skin_positions(&self, graph: &mut SceneGraph) -> Vec<Vec3> {
        let joints = self.joint_matrices(graph);
        let mesh_world = self.mesh_world(graph);

        self.mesh
            .vertices
            .iter()
            .map(|v| {
                let rest = Vec3::from(v.position);
                let skinned = v
                    .joints
                    .iter()
                    .zip(v.weights)
                    .filter(|&(_, w)| w > 0.0)
                    .filter_map(|(&j, w)| joints.get(j as usize).map(|m| m.transform_point3(rest) * w))
                    .fold(Vec3::ZERO, |acc, p| acc + p);
                mesh_world.transform_point3(skinned)
            })
            .collect()
    }
}
