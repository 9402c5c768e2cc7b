//! Keypoint tables shared by build.rs and the runtime topology registry.
//!
//! The build script includes this file to reject malformed tables at compile
//! time; the runtime runs the same validation once at startup.

// Some helpers are only used by build.rs
#![allow(dead_code)]

/// Reduced BlazePose body layout (one arm and one leg are tracked).
///
/// ```text
///           (0) HEAD
///    --------|---------
///  (12)   |      |   (11)
///    |    |      |    |
///  (14)   |      |   (13)
///    |    |      |    |
///  (16)   |      |   (15)
///         |      |
///       (24)   (23)
///         |      |
///       (26)   (25)
///         |      |
///       (28)   (27)
/// ```
pub const BODYPOSE_SIZE: usize = 33;

pub const BODYPOSE_LIMBS: &[&[usize]] = &[&[0, 11, 13, 15], &[0, 24, 26, 28]];

pub const BODYPOSE_END_INDICES: &[usize] = &[15, 16, 27, 28];

pub const BODYPOSE_IGNORED_INDICES: &[usize] = &[
    12, 14, 16, // right arm
    23, 25, 27, // left leg
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 17, 18, 19, 20, 21, 22, 29, 30, 31, 32,
];

/// Converts normalized body keypoints into scene units.
pub const BODYPOSE_BASE_SCALAR: f32 = 1000.0;

/// Hand landmark layout.
///
/// ```text
///              (0) WRIST
///               |
///      ---------------------
///    |     |     |     |     |
///   (1)   (5)   (9)  (13)  (17)
///    |     |     |     |     |
///   (2)   (6)  (10)  (14)  (18)
///    |     |     |     |     |
///   (3)   (7)  (11)  (15)  (19)
///    |     |     |     |     |
///   (4)   (8)  (12)  (16)  (20)
/// ```
pub const HANDPOSE_SIZE: usize = 21;

pub const HANDPOSE_LIMBS: &[&[usize]] = &[
    &[0, 1, 2, 3, 4],
    &[0, 5, 6, 7, 8],
    &[0, 13, 14, 15, 16],
    &[0, 9, 10, 11, 12],
    &[0, 17, 18, 19, 20],
];

pub const HANDPOSE_END_INDICES: &[usize] = &[4, 8, 12, 16, 20];

pub const HANDPOSE_IGNORED_INDICES: &[usize] = &[];

/// Hand keypoints span a much smaller range than body keypoints.
pub const HANDPOSE_BASE_SCALAR: f32 = 2500.0;

/// Check a table set for the invariants the skeleton builder relies on.
///
/// Returns the shared limb length (the bone count of a skinned limb).
pub fn validate_tables(
    name: &str,
    size: usize,
    limbs: &[&[usize]],
    ignored: &[usize],
    ends: &[usize],
) -> Result<usize, String> {
    let mut parents: Vec<Option<usize>> = vec![None; size];

    if ignored.contains(&0) {
        return Err(format!("{}: root keypoint 0 is ignored", name));
    }
    if let Some(&bad) = ignored.iter().chain(ends).find(|&&i| i >= size) {
        return Err(format!("{}: index {} is out of range (size {})", name, bad, size));
    }

    let chain_len = match limbs.first() {
        Some(limb) => limb.len(),
        None => return Err(format!("{}: no limbs", name)),
    };

    for (n, limb) in limbs.iter().enumerate() {
        if limb.len() != chain_len {
            return Err(format!(
                "{}: limb {} has {} keypoints, expected {}",
                name,
                n,
                limb.len(),
                chain_len
            ));
        }
        if limb.first() != Some(&0) {
            return Err(format!("{}: limb {} does not start at the root", name, n));
        }

        for pair in limb.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            if child >= size {
                return Err(format!("{}: index {} is out of range (size {})", name, child, size));
            }
            if ignored.contains(&child) {
                return Err(format!("{}: limb {} uses ignored index {}", name, n, child));
            }
            // Ascending order doubles as the topological order.
            if parent >= child {
                return Err(format!(
                    "{}: parent {} is not below child {} in limb {}",
                    name, parent, child, n
                ));
            }
            match parents[child] {
                Some(existing) if existing != parent => {
                    return Err(format!(
                        "{}: keypoint {} has two parents ({} and {})",
                        name, child, existing, parent
                    ));
                }
                _ => parents[child] = Some(parent),
            }
        }
    }

    // Every tracked keypoint must hang off the root through some limb
    if let Some(orphan) = (1..size).find(|&i| !ignored.contains(&i) && parents[i].is_none()) {
        return Err(format!("{}: keypoint {} is tracked but belongs to no limb", name, orphan));
    }

    Ok(chain_len)
}
