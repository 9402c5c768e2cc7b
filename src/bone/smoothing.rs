/// Position gap (scene units) below which a bone snaps onto its target.
/// Scene scale is on the order of 1000 units.
pub const POSITION_SNAP_DISTANCE: f32 = 5.0;

/// Angular gap (radians) below which a bone snaps onto its target.
pub const ORIENTATION_SNAP_ANGLE: f32 = 0.05;

/// Per-tick approach parameters shared by every bone of a rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    /// Fraction of the remaining gap closed each tick, in (0, 1]
    pub lerp_factor: f32,
    pub position_snap: f32,
    pub orientation_snap: f32,
}

impl Smoothing {
    pub fn new(lerp_factor: f32) -> Self {
        Self {
            lerp_factor,
            position_snap: POSITION_SNAP_DISTANCE,
            orientation_snap: ORIENTATION_SNAP_ANGLE,
        }
    }

    /// Upper bound on interpolating ticks before a position gap of `distance`
    /// snaps: the gap shrinks by `1 - lerp_factor` per tick.
    #[cfg(test)]
    pub(crate) fn max_position_ticks(&self, distance: f32) -> usize {
        if distance < self.position_snap {
            return 0;
        }
        if self.lerp_factor >= 1.0 {
            return 1;
        }
        let ticks = (distance / self.position_snap).ln() / (1.0 / (1.0 - self.lerp_factor)).ln();
        ticks.floor() as usize + 1
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::new(0.1)
    }
}
