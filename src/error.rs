use crate::rig::TreeId;
use crate::scene::NodeId;

/// Errors raised while assembling a rig.
///
/// Everything here is a startup failure: once a rig is built, the per-tick
/// path has nothing fallible left.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("unknown pose type `{0}` (expected `hand` or `body`)")]
    UnknownPoseType(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid keypoint topology: {0}")]
    Topology(String),

    #[error("cannot attach {child:?} under {parent:?}: it would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },

    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),

    #[error("unknown skeleton tree {0:?}")]
    UnknownTree(TreeId),
}
