//! Tube skins for limb chains: geometry, weights, template cache and binding.

pub mod binding;
pub mod cache;
pub mod tube;
pub mod weights;

pub use binding::SkinnedLimb;
pub use cache::SkinMeshCache;
pub use tube::{SkinnedVertex, TubeMesh, TubeParams};
pub use weights::bone_weights;
