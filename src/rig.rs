//! Composition root: owns the scene, every tree, the pose channel and the
//! skins, and drives them once per frame.

use glam::Mat4;

use crate::bone::Smoothing;
use crate::channel::{PoseBatch, PoseChannel};
use crate::config::RigConfig;
use crate::error::RigError;
use crate::fractal::Forest;
use crate::scene::{NodeId, SceneGraph, Transform};
use crate::skin::{SkinMeshCache, SkinnedLimb, TubeParams};
use crate::tree::SkeletonTree;

/// Handle to a tree owned by a [`Rig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(usize);

impl TreeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// The top-level tree is always the first one built
pub const TOP_TREE: TreeId = TreeId(0);

#[derive(Debug)]
pub struct Rig {
    config: RigConfig,
    graph: SceneGraph,
    world_root: NodeId,
    trees: Vec<SkeletonTree>,
    channel: PoseChannel,
    cache: SkinMeshCache,
    limbs: Vec<SkinnedLimb>,
    smoothing: Smoothing,
}

impl Rig {
    /// Build the top tree, its nested generations and their skins.
    pub fn new(config: RigConfig) -> Result<Self, RigError> {
        config.validate()?;

        let topology = config.pose_type.topology();
        let mut graph = SceneGraph::new();
        let mut channel = PoseChannel::new();
        let world_root = graph.add_node(Transform::IDENTITY);

        let top = SkeletonTree::new(
            &mut graph,
            &mut channel,
            config.pose_type,
            0,
            config.align_all_poses_up,
        )?;
        graph.attach(top.root(), world_root)?;
        let mut trees = vec![top];

        Forest {
            graph: &mut graph,
            channel: &mut channel,
            trees: &mut trees,
        }
        .expand(TOP_TREE, config.fractal_level, config.scale_factor)?;

        let cache = SkinMeshCache::new(TubeParams::new(
            topology.skin_bone_count(),
            config.scale_factor,
        ));

        let mut rig = Self {
            smoothing: Smoothing::new(config.lerp_factor),
            config,
            graph,
            world_root,
            trees,
            channel,
            cache,
            limbs: Vec::new(),
        };

        if !rig.config.hide_mesh {
            rig.bind_skins();
        }

        log::info!(
            "Built {} rig: {} trees, {} bones, {} skinned limbs",
            rig.config.pose_type,
            rig.trees.len(),
            rig.graph.len() - 1,
            rig.limbs.len()
        );
        if rig.config.debug_mode {
            for (i, tree) in rig.trees.iter().enumerate() {
                log::debug!("  tree {}: scale {}, pose {}", i, tree.scale(), tree.pose_id());
            }
        }

        Ok(rig)
    }

    fn bind_skins(&mut self) {
        for tree in &self.trees {
            let anchor = self.graph.parent(tree.root());
            for chain in tree.limb_chains() {
                let mesh = self.cache.get(tree.scale());
                self.limbs
                    .push(SkinnedLimb::bind(&mut self.graph, chain, mesh, anchor));
            }
        }
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn smoothing(&self) -> &Smoothing {
        &self.smoothing
    }

    /// Publish a detector batch to every tree
    pub fn publish(&mut self, batch: impl Into<PoseBatch>) -> usize {
        self.channel.publish(batch)
    }

    pub fn channel_mut(&mut self) -> &mut PoseChannel {
        &mut self.channel
    }

    /// One frame: take new poses, retarget, then move every bone.
    ///
    /// Returns true while any bone is still easing toward its target.
    pub fn tick(&mut self) -> bool {
        for tree in &mut self.trees {
            tree.poll_poses();
        }
        for tree in &mut self.trees {
            tree.update(&mut self.graph);
        }

        let mut moving = false;
        for tree in &self.trees {
            moving |= tree.advance(&mut self.graph, &self.smoothing);
        }
        moving
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Node every top-level tree hangs from; move it to place the whole rig
    pub fn world_root(&self) -> NodeId {
        self.world_root
    }

    pub fn tree(&self, id: TreeId) -> Result<&SkeletonTree, RigError> {
        self.trees.get(id.index()).ok_or(RigError::UnknownTree(id))
    }

    pub fn tree_mut(&mut self, id: TreeId) -> Result<&mut SkeletonTree, RigError> {
        self.trees.get_mut(id.index()).ok_or(RigError::UnknownTree(id))
    }

    pub fn trees(&self) -> &[SkeletonTree] {
        &self.trees
    }

    pub fn tree_ids(&self) -> impl Iterator<Item = TreeId> {
        (0..self.trees.len()).map(TreeId)
    }

    pub fn limbs(&self) -> &[SkinnedLimb] {
        &self.limbs
    }

    pub fn cache(&self) -> &SkinMeshCache {
        &self.cache
    }

    /// World matrix of every bone, tree by tree in keypoint order
    pub fn bone_world_matrices(&mut self) -> Vec<Mat4> {
        let nodes: Vec<NodeId> = self
            .trees
            .iter()
            .flat_map(|tree| tree.bones().map(|b| b.node()))
            .collect();
        nodes
            .into_iter()
            .map(|node| self.graph.world_matrix(node))
            .collect()
    }

    pub fn joint_matrices(&mut self, limb: usize) -> Option<Vec<Mat4>> {
        let limb = self.limbs.get(limb)?;
        Some(limb.joint_matrices(&mut self.graph))
    }

    pub fn skin_positions(&mut self, limb: usize) -> Option<Vec<glam::Vec3>> {
        let limb = self.limbs.get(limb)?;
        Some(limb.skin_positions(&mut self.graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;
    use crate::skin::tube::{HEIGHT_SEGMENTS, RADIAL_SEGMENTS};
    use crate::topology::PoseType;
    use crate::tree::REST_OFFSET;
    use glam::Vec3;

    fn body_config(level: u32) -> RigConfig {
        RigConfig {
            fractal_level: level,
            ..RigConfig::new(PoseType::Body)
        }
    }

    fn arm_pose() -> Pose {
        let mut keypoints = vec![Vec3::ZERO; 33];
        keypoints[11] = Vec3::new(0.1, 0.2, 0.0);
        keypoints[13] = Vec3::new(0.3, 0.3, 0.0);
        keypoints[15] = Vec3::new(0.5, 0.2, 0.1);
        keypoints[24] = Vec3::new(0.0, -0.3, 0.0);
        keypoints[26] = Vec3::new(0.0, -0.6, 0.1);
        keypoints[28] = Vec3::new(0.1, -0.9, 0.0);
        Pose::from_keypoints(keypoints)
    }

    #[test]
    fn test_single_tree_rig() {
        let rig = Rig::new(body_config(0)).unwrap();
        assert_eq!(rig.trees().len(), 1);
        assert_eq!(rig.graph().parent(rig.trees()[0].root()), Some(rig.world_root()));
        assert_eq!(rig.limbs().len(), 2);
        assert_eq!(rig.cache().template_count(), 1);
    }

    #[test]
    fn test_fractal_levels_and_scales() {
        let rig = Rig::new(body_config(2)).unwrap();
        assert_eq!(rig.trees().len(), 1 + 2 + 4);

        let mut scales: Vec<f32> = rig.trees().iter().map(SkeletonTree::scale).collect();
        scales.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(scales, vec![1.0, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25]);

        // Two limbs per tree, one template per distinct scale
        assert_eq!(rig.limbs().len(), 14);
        assert_eq!(rig.cache().template_count(), 3);
    }

    #[test]
    fn test_hand_rig_defaults() {
        let rig = Rig::new(RigConfig::new(PoseType::Hand)).unwrap();
        assert_eq!(rig.trees().len(), 6);
        assert_eq!(rig.limbs().len(), 30);
        assert!(rig.limbs().iter().all(|l| l.bones().len() == 5 && l.mesh().bone_count == 5));
    }

    #[test]
    fn test_hide_mesh_skips_skins() {
        let config = RigConfig {
            hide_mesh: true,
            ..body_config(1)
        };
        let rig = Rig::new(config).unwrap();
        assert!(rig.limbs().is_empty());
        assert_eq!(rig.cache().template_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RigConfig {
            lerp_factor: 0.0,
            ..body_config(1)
        };
        assert!(matches!(Rig::new(config), Err(RigError::Config(_))));
    }

    #[test]
    fn test_unknown_tree() {
        let rig = Rig::new(body_config(0)).unwrap();
        assert!(rig.tree(TOP_TREE).is_ok());
        assert!(matches!(rig.tree(TreeId(9)), Err(RigError::UnknownTree(_))));
    }

    #[test]
    fn test_tick_without_poses_is_idle() {
        let mut rig = Rig::new(body_config(1)).unwrap();
        let before = rig.bone_world_matrices();
        assert!(!rig.tick());
        assert_eq!(rig.bone_world_matrices(), before);
    }

    #[test]
    fn test_every_tree_follows_pose_zero() {
        let mut rig = Rig::new(body_config(1)).unwrap();
        assert_eq!(rig.publish(vec![arm_pose()]), 3);
        rig.tick();

        for tree in rig.trees() {
            assert!(tree.target_pose().is_some());
        }
    }

    #[test]
    fn test_top_tree_converges() {
        let config = RigConfig {
            lerp_factor: 0.5,
            ..body_config(1)
        };
        let mut rig = Rig::new(config).unwrap();
        let pose = arm_pose();
        rig.publish(vec![pose.clone()]);

        let mut ticks = 0;
        while rig.tick() {
            ticks += 1;
            assert!(ticks < 1000, "rig never settled");
        }
        for _ in 0..8 {
            rig.tick();
        }

        let top = rig.tree(TOP_TREE).unwrap();
        let root = top.root();
        let nodes: Vec<(usize, NodeId)> = [11, 13, 15, 24, 26, 28]
            .into_iter()
            .map(|i| (i, top.bone(i).unwrap().node()))
            .collect();
        let graph = rig.graph_mut();
        let origin = graph.world_translation(root);
        for (i, node) in nodes {
            let expected = origin + pose.keypoint(i).unwrap() * 1000.0;
            let actual = graph.world_translation(node);
            assert!((actual - expected).length() < 0.5, "{}: {:?} vs {:?}", i, actual, expected);
        }
    }

    #[test]
    fn test_skins_follow_bones() {
        let mut rig = Rig::new(body_config(0)).unwrap();
        let rest = rig.skin_positions(0).unwrap();

        rig.publish(vec![arm_pose()]);
        for _ in 0..20 {
            rig.tick();
        }
        let moved = rig.skin_positions(0).unwrap();
        assert_eq!(rest.len(), moved.len());
        assert!(rest.iter().zip(&moved).any(|(a, b)| a.distance(*b) > 1.0));
        assert_eq!(rig.joint_matrices(0).unwrap().len(), 4);
        assert!(rig.joint_matrices(2).is_none());
    }

    /// Centre of one tube ring, skipping the duplicated seam vertex
    fn ring_center(positions: &[Vec3], row: usize) -> Vec3 {
        let start = row * (RADIAL_SEGMENTS + 1);
        positions[start..start + RADIAL_SEGMENTS].iter().sum::<Vec3>() / RADIAL_SEGMENTS as f32
    }

    #[test]
    fn test_nested_skins_stay_on_their_bones() {
        let config = RigConfig {
            lerp_factor: 0.5,
            ..body_config(1)
        };
        let mut rig = Rig::new(config).unwrap();
        rig.publish(vec![arm_pose()]);

        let mut ticks = 0;
        while rig.tick() {
            ticks += 1;
            assert!(ticks < 1000, "rig never settled");
        }
        for _ in 0..8 {
            rig.tick();
        }

        let world_root = rig.world_root();
        let nested: Vec<(usize, NodeId, NodeId, NodeId)> = rig
            .limbs()
            .iter()
            .enumerate()
            .filter(|(_, limb)| limb.anchor() != Some(world_root))
            .map(|(i, limb)| {
                let bones = limb.bones();
                (i, limb.anchor().unwrap(), bones[0], bones[bones.len() - 1])
            })
            .collect();
        assert_eq!(nested.len(), 4);

        for (i, anchor, first, last) in nested {
            let positions = rig.skin_positions(i).unwrap();
            let graph = rig.graph_mut();
            let anchor_at = graph.world_translation(anchor);
            let first_at = graph.world_translation(first);
            let last_at = graph.world_translation(last);

            // The end bone carrying this tree has left its rest spot
            assert!(anchor_at.distance(Vec3::new(0.0, 40.0, 0.0)) > 100.0);

            // Base ring sits on bone 0, one rest offset below the chain root
            let base = ring_center(&positions, HEIGHT_SEGMENTS);
            assert!(base.distance(anchor_at) < 0.05, "limb {}: base {:?} vs {:?}", i, base, anchor_at);
            assert!((base.distance(first_at) - REST_OFFSET.length()).abs() < 0.05);

            // Tip ring rides on the last bone
            let tip = ring_center(&positions, 0);
            assert!(tip.distance(last_at) < 0.05, "limb {}: tip {:?} vs {:?}", i, tip, last_at);
        }
    }

    #[test]
    fn test_moving_world_root_shifts_skins_once() {
        let mut rig = Rig::new(body_config(0)).unwrap();
        let before = rig.skin_positions(0).unwrap();

        let root = rig.world_root();
        rig.graph_mut().set_translation(root, Vec3::new(100.0, 0.0, 0.0));
        let after = rig.skin_positions(0).unwrap();

        for (a, b) in after.iter().zip(&before) {
            assert!((*a - *b - Vec3::new(100.0, 0.0, 0.0)).length() < 1e-3, "{:?} vs {:?}", a, b);
        }
    }
}
