//! Nested trees hung off the endpoints of a parent tree.
//!
//! Every end bone of a tree gets a child tree of the same pose type, scaled by
//! `scale_factor` per generation. The children follow pose 0 just like the top
//! tree, so the whole structure mirrors one detected skeleton at every level.

use crate::channel::PoseChannel;
use crate::error::RigError;
use crate::rig::TreeId;
use crate::scene::SceneGraph;
use crate::topology::PoseType;
use crate::tree::SkeletonTree;

/// Pose id followed by every nested tree
pub const NESTED_POSE_ID: usize = 0;

/// Scene parts a fractal expansion builds into
pub struct Forest<'a> {
    pub graph: &'a mut SceneGraph,
    pub channel: &'a mut PoseChannel,
    pub trees: &'a mut Vec<SkeletonTree>,
}

impl Forest<'_> {
    /// Hang `levels` generations of child trees under `parent`'s end bones.
    ///
    /// Returns the ids of every created tree, parents before their children.
    pub fn expand(
        &mut self,
        parent: TreeId,
        levels: u32,
        scale_factor: f32,
    ) -> Result<Vec<TreeId>, RigError> {
        let mut created = Vec::new();
        self.expand_from(parent, levels, 1, scale_factor, &mut created)?;
        if !created.is_empty() {
            log::info!(
                "Expanded {:?} into {} nested trees over {} levels",
                parent,
                created.len(),
                levels
            );
        }
        Ok(created)
    }

    fn expand_from(
        &mut self,
        parent: TreeId,
        levels: u32,
        depth: i32,
        scale_factor: f32,
        created: &mut Vec<TreeId>,
    ) -> Result<(), RigError> {
        if levels == 0 {
            return Ok(());
        }

        let (pose_type, ends) = {
            let tree = self
                .trees
                .get(parent.index())
                .ok_or(RigError::UnknownTree(parent))?;
            (tree.pose_type(), tree.ends())
        };

        for end in ends {
            let mut child = SkeletonTree::new(
                self.graph,
                self.channel,
                pose_type,
                NESTED_POSE_ID,
                pose_type == PoseType::Hand,
            )?;
            child.set_scale(scale_factor.powi(depth));
            self.graph.attach(child.root(), end)?;

            let id = TreeId::new(self.trees.len());
            self.trees.push(child);
            created.push(id);

            self.expand_from(id, levels - 1, depth + 1, scale_factor, created)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest_parts(pose_type: PoseType) -> (SceneGraph, PoseChannel, Vec<SkeletonTree>) {
        let mut graph = SceneGraph::new();
        let mut channel = PoseChannel::new();
        let top = SkeletonTree::new(&mut graph, &mut channel, pose_type, 0, false).unwrap();
        (graph, channel, vec![top])
    }

    #[test]
    fn test_two_levels_on_body() {
        let (mut graph, mut channel, mut trees) = forest_parts(PoseType::Body);
        let created = Forest {
            graph: &mut graph,
            channel: &mut channel,
            trees: &mut trees,
        }
        .expand(TreeId::new(0), 2, 0.5)
        .unwrap();

        // Two endpoints, each child has two endpoints of its own
        assert_eq!(created.len(), 2 + 2 * 2);
        assert_eq!(trees.len(), 7);
        assert_eq!(channel.subscriber_count(), 7);

        let first_gen: Vec<_> = created
            .iter()
            .filter(|id| trees[id.index()].scale() == 0.5)
            .collect();
        let leaves: Vec<_> = created
            .iter()
            .filter(|id| trees[id.index()].scale() == 0.25)
            .collect();
        assert_eq!(first_gen.len(), 2);
        assert_eq!(leaves.len(), 4);

        for id in &created {
            let tree = &trees[id.index()];
            assert_eq!(tree.pose_id(), NESTED_POSE_ID);
            assert!(!tree.should_align());
        }
    }

    #[test]
    fn test_children_hang_off_end_bones() {
        let (mut graph, mut channel, mut trees) = forest_parts(PoseType::Body);
        let top_ends = trees[0].ends();
        let created = Forest {
            graph: &mut graph,
            channel: &mut channel,
            trees: &mut trees,
        }
        .expand(TreeId::new(0), 1, 0.5)
        .unwrap();

        let parents: Vec<_> = created
            .iter()
            .map(|id| graph.parent(trees[id.index()].root()))
            .collect();
        assert_eq!(parents, top_ends.into_iter().map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn test_hand_children_align() {
        let (mut graph, mut channel, mut trees) = forest_parts(PoseType::Hand);
        let created = Forest {
            graph: &mut graph,
            channel: &mut channel,
            trees: &mut trees,
        }
        .expand(TreeId::new(0), 1, 0.3)
        .unwrap();

        assert_eq!(created.len(), 5);
        assert!(created.iter().all(|id| trees[id.index()].should_align()));
    }

    #[test]
    fn test_zero_levels_creates_nothing() {
        let (mut graph, mut channel, mut trees) = forest_parts(PoseType::Hand);
        let created = Forest {
            graph: &mut graph,
            channel: &mut channel,
            trees: &mut trees,
        }
        .expand(TreeId::new(0), 0, 0.5)
        .unwrap();
        assert!(created.is_empty());
        assert_eq!(trees.len(), 1);
    }

    #[test]
    fn test_unknown_parent() {
        let (mut graph, mut channel, mut trees) = forest_parts(PoseType::Body);
        let result = Forest {
            graph: &mut graph,
            channel: &mut channel,
            trees: &mut trees,
        }
        .expand(TreeId::new(3), 1, 0.5);
        assert!(matches!(result, Err(RigError::UnknownTree(_))));
    }
}
