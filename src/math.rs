//! Small glam helpers shared by the retargeting and skinning code.

pub use glam::{Mat4, Quat, Vec3};

/// Rotation that carries a pose's alignment vector onto local up (+Y).
///
/// A zero (or non-finite) alignment vector yields the identity.
pub fn alignment_rotation(alignment: Vec3) -> Quat {
    match alignment.try_normalize() {
        Some(dir) => Quat::from_rotation_arc(dir, Vec3::Y),
        None => Quat::IDENTITY,
    }
}

/// Extension trait for per-vertex skinning weights
pub trait WeightsExt {
    /// Scale so the components sum to one; all-zero input becomes `[1, 0, 0, 0]`
    fn normalized_weights(self) -> Self;
}

impl WeightsExt for [f32; 4] {
    fn normalized_weights(self) -> Self {
        let sum: f32 = self.iter().sum();
        if sum <= f32::EPSILON {
            return [1.0, 0.0, 0.0, 0.0];
        }
        self.map(|w| w / sum)
    }
}
