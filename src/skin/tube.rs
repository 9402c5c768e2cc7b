//! Procedural tapered tube, skinned along its length.
//!
//! Layout follows the usual open-ended cylinder construction: rings from the
//! tip (row 0) down to the base, each ring with a duplicated seam vertex so
//! texture coordinates can wrap.

use glam::Vec3;

use super::weights::bone_weights;

/// Vertex format for a skinned tube
///
/// Up to four bones influence each vertex; unused slots carry zero weight.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkinnedVertex {
    /// Bind-pose position, base of the tube at the origin, tube along +Y
    pub position: [f32; 3],
    /// Surface normal for lighting
    pub normal: [f32; 3],
    /// Bone slots, indexing into the limb chain
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<SkinnedVertex>(), 56);

/// Length of the tube covered by one bone
pub const SEGMENT_LENGTH: f32 = 10.0;
/// Radius of the tube base at scale 1
pub const BASE_RADIUS: f32 = 100.0;
/// Segments around the tube
pub const RADIAL_SEGMENTS: usize = 8;
/// Rings along the tube; more rings give smoother bends
pub const HEIGHT_SEGMENTS: usize = 10;

/// Shape parameters shared by every tube of a rig
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeParams {
    pub bone_count: usize,
    pub segment_length: f32,
    pub base_radius: f32,
    /// Tip radius as a fraction of the base radius
    pub taper: f32,
    pub radial_segments: usize,
    pub height_segments: usize,
}

impl TubeParams {
    pub fn new(bone_count: usize, taper: f32) -> Self {
        Self {
            bone_count,
            segment_length: SEGMENT_LENGTH,
            base_radius: BASE_RADIUS,
            taper,
            radial_segments: RADIAL_SEGMENTS,
            height_segments: HEIGHT_SEGMENTS,
        }
    }

    pub fn length(&self) -> f32 {
        self.segment_length * self.bone_count as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    pub bone_count: usize,
    pub length: f32,
}

impl TubeMesh {
    /// Build the tube for a tree of the given scale
    pub fn build(params: &TubeParams, scale: f32) -> Self {
        let length = params.length();
        let radius_base = params.base_radius * scale;
        let radius_tip = radius_base * params.taper;
        let radial = params.radial_segments.max(3);
        let rings = params.height_segments.max(1);
        // Cone slope for the normals
        let slope = (radius_base - radius_tip) / length;

        let mut vertices = Vec::with_capacity((rings + 1) * (radial + 1));
        for row in 0..=rings {
            // v runs from the tip (0) to the base (1)
            let v = row as f32 / rings as f32;
            let radius = radius_tip + v * (radius_base - radius_tip);
            let y = (1.0 - v) * length;
            let (joints, weights) = bone_weights(y, params.segment_length, params.bone_count);

            for col in 0..=radial {
                let theta = col as f32 / radial as f32 * std::f32::consts::TAU;
                let (sin, cos) = theta.sin_cos();
                let normal = Vec3::new(sin, slope, cos).normalize();
                vertices.push(SkinnedVertex {
                    position: [radius * sin, y, radius * cos],
                    normal: normal.to_array(),
                    joints,
                    weights,
                });
            }
        }

        let stride = (radial + 1) as u32;
        let mut indices = Vec::with_capacity(rings * radial * 6);
        for row in 0..rings as u32 {
            for col in 0..radial as u32 {
                let a = row * stride + col;
                let b = (row + 1) * stride + col;
                let c = (row + 1) * stride + col + 1;
                let d = row * stride + col + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            vertices,
            indices,
            bone_count: params.bone_count,
            length,
        }
    }

    /// Raw vertex bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
