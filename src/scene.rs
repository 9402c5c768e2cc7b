//! Minimal transform-node host.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node owns a
//! local transform; world transforms are cached and recomputed lazily.
//!
//! ## Dirty tracking
//!
//! Changing a local transform marks the node and its whole subtree dirty.
//! Reading a world transform computes dirty ancestors first (top-down), so a
//! read never sees a stale parent. Marking stops at nodes that are already
//! dirty: a dirty node never has a clean descendant, because a descendant can
//! only be cleaned after all of its ancestors.
//!
//! Node scale is assumed uniform, so the world rotation is the product of the
//! local rotations along the path.

use glam::{Mat4, Quat, Vec3};

use crate::error::RigError;

/// Handle to a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Local transform relative to the parent node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
struct Node {
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world_matrix: Mat4,
    world_rotation: Quat,
    dirty: bool,
}

/// Arena of transform nodes.
///
/// # Panics
///
/// Accessors taking a [`NodeId`] index the arena directly and panic on an id
/// this graph did not hand out. Only [`SceneGraph::attach`] validates its
/// arguments and returns [`RigError::UnknownNode`]; check a foreign id with
/// [`SceneGraph::contains`] first.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node
    pub fn add_node(&mut self, local: Transform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            local,
            parent: None,
            children: Vec::new(),
            world_matrix: Mat4::IDENTITY,
            world_rotation: Quat::IDENTITY,
            dirty: true,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn check(&self, id: NodeId) -> Result<(), RigError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RigError::UnknownNode(id))
        }
    }

    /// Make `child` a child of `parent`, detaching it from any previous parent.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), RigError> {
        self.check(child)?;
        self.check(parent)?;

        // Refuse if `parent` sits inside `child`'s subtree (or is `child`)
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(RigError::Cycle { child, parent });
            }
            cursor = self.nodes[id.index()].parent;
        }

        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        self.mark_dirty(child);
        Ok(())
    }

    /// Remove `id` from its parent; its subtree stays intact
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != id);
            self.mark_dirty(id);
        }
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    #[inline]
    pub fn local(&self, id: NodeId) -> &Transform {
        &self.nodes[id.index()].local
    }

    pub fn set_local(&mut self, id: NodeId, local: Transform) {
        self.nodes[id.index()].local = local;
        self.mark_dirty(id);
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec3) {
        self.nodes[id.index()].local.translation = translation;
        self.mark_dirty(id);
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) {
        self.nodes[id.index()].local.rotation = rotation;
        self.mark_dirty(id);
    }

    /// Whether the cached world transform is out of date
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.nodes[id.index()].dirty
    }

    fn mark_dirty(&mut self, id: NodeId) {
        let mut stack = vec![id];
        // `id` itself is always marked, even if already dirty
        let mut first = true;
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.index()];
            if node.dirty && !first {
                continue;
            }
            first = false;
            node.dirty = true;
            stack.extend_from_slice(&node.children);
        }
    }

    /// Bring the cached world transform of `id` up to date and return it.
    ///
    /// Dirty ancestors are recomputed first, root side down.
    pub fn update_world_matrix(&mut self, id: NodeId) -> Mat4 {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.index()];
            if !node.dirty {
                break;
            }
            chain.push(current);
            cursor = node.parent;
        }

        for &current in chain.iter().rev() {
            self.compute_node(current);
        }
        self.nodes[id.index()].world_matrix
    }

    fn compute_node(&mut self, id: NodeId) {
        let (parent_matrix, parent_rotation) = match self.nodes[id.index()].parent {
            Some(parent) => {
                let p = &self.nodes[parent.index()];
                (p.world_matrix, p.world_rotation)
            }
            None => (Mat4::IDENTITY, Quat::IDENTITY),
        };

        let node = &mut self.nodes[id.index()];
        node.world_matrix = parent_matrix * node.local.to_matrix();
        node.world_rotation = (parent_rotation * node.local.rotation).normalize();
        node.dirty = false;
    }

    /// World matrix, refreshed if needed
    pub fn world_matrix(&mut self, id: NodeId) -> Mat4 {
        self.update_world_matrix(id)
    }

    /// World orientation, refreshed if needed
    pub fn world_rotation(&mut self, id: NodeId) -> Quat {
        self.update_world_matrix(id);
        self.nodes[id.index()].world_rotation
    }

    /// World position of the node origin, refreshed if needed
    pub fn world_translation(&mut self, id: NodeId) -> Vec3 {
        self.update_world_matrix(id).w_axis.truncate()
    }

    /// Refresh every dirty node; handy before handing the graph to a renderer
    pub fn update_all(&mut self) {
        for i in 0..self.nodes.len() {
            if self.nodes[i].dirty {
                self.update_world_matrix(NodeId(i as u32));
            }
        }
    }
}
