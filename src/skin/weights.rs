use crate::math::WeightsExt;

/// Bone slots and weights for a vertex at height `y` along a tube made of
/// `bone_count` segments of `segment_length`.
///
/// Slots are `[current, previous, next, unused]`. The first bone only blends
/// toward the next one, the last bone takes the whole vertex, interior bones
/// blend both neighbours. Weights always sum to one.
pub fn bone_weights(y: f32, segment_length: f32, bone_count: usize) -> ([u32; 4], [f32; 4]) {
    let last = bone_count.saturating_sub(1);
    let bone = ((y / segment_length).floor().max(0.0) as usize).min(last);

    if bone == last {
        return ([bone as u32, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]);
    }

    let t = y.rem_euclid(segment_length) / segment_length;
    let previous = bone.saturating_sub(1);
    let next = (bone + 1).min(last);

    let current_w = 1.0 - (t - 0.5).abs();
    let next_w = t / 3.0;
    let previous_w = if bone == 0 { 0.0 } else { (1.0 - t) / 3.0 };

    let weights = [current_w, previous_w, next_w, 0.0].normalized_weights();
    ([bone as u32, previous as u32, next as u32, 0], weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENT: f32 = 10.0;

    #[test]
    fn test_weights_sum_to_one() {
        for bone_count in 1..=6 {
            let length = SEGMENT * bone_count as f32;
            for step in 0..=200 {
                let y = length * step as f32 / 200.0;
                let (joints, weights) = bone_weights(y, SEGMENT, bone_count);
                let sum: f32 = weights.iter().sum();
                assert!((sum - 1.0).abs() < 1e-5, "y={} sum={}", y, sum);
                assert!(weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
                assert!(joints.iter().all(|&j| (j as usize) < bone_count));
                assert_eq!(weights[3], 0.0);
            }
        }
    }

    #[test]
    fn test_first_bone_has_no_previous_weight() {
        for y in [0.0, 2.5, 5.0, 9.99] {
            let (joints, weights) = bone_weights(y, SEGMENT, 4);
            assert_eq!(joints[0], 0);
            assert_eq!(weights[1], 0.0);
            assert_eq!(joints[2], 1);
        }
    }

    #[test]
    fn test_last_bone_is_fully_weighted() {
        for y in [30.0, 35.0, 40.0, 55.0] {
            let (joints, weights) = bone_weights(y, SEGMENT, 4);
            assert_eq!(joints, [3, 0, 0, 0]);
            assert_eq!(weights, [1.0, 0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_interior_blend() {
        // Middle of bone 1: current peaks, neighbours share the rest evenly
        let (joints, weights) = bone_weights(15.0, SEGMENT, 4);
        assert_eq!(joints, [1, 0, 2, 0]);
        let raw = [1.0, 0.5 / 3.0, 0.5 / 3.0];
        let sum: f32 = raw.iter().sum();
        for k in 0..3 {
            assert!((weights[k] - raw[k] / sum).abs() < 1e-6);
        }
        assert!(weights[0] > weights[1]);
        assert!((weights[1] - weights[2]).abs() < 1e-6);
    }

    #[test]
    fn test_single_bone_tube() {
        let (joints, weights) = bone_weights(3.0, SEGMENT, 1);
        assert_eq!(joints, [0, 0, 0, 0]);
        assert_eq!(weights, [1.0, 0.0, 0.0, 0.0]);
    }
}
