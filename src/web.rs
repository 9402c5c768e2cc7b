//! Browser bindings.
//!
//! The host page builds a `WebRig` from a plain config object, pushes
//! detector batches as they arrive and calls `tick()` once per animation
//! frame. Matrices come back column-major, 16 floats each.

use wasm_bindgen::prelude::*;

use crate::config::RigConfig;
use crate::pose::Pose;
use crate::rig::Rig;
use crate::skin::SkinnedLimb;

cfg_if::cfg_if! {
    if #[cfg(debug_assertions)] {
        const DEFAULT_LEVEL: log::Level = log::Level::Info;
    } else {
        const DEFAULT_LEVEL: log::Level = log::Level::Warn;
    }
}

/// Install the panic hook and console logger.
///
/// Safe to call more than once; later calls leave the first logger in place.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(debug: bool) {
    console_error_panic_hook::set_once();

    let level = if debug { log::Level::Debug } else { DEFAULT_LEVEL };
    console_log::init_with_level(level).ok();
}

#[wasm_bindgen]
pub struct WebRig {
    rig: Rig,
}

#[wasm_bindgen]
impl WebRig {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WebRig, JsError> {
        let config: RigConfig = serde_wasm_bindgen::from_value(config)?;
        init_logging(config.debug_mode);
        let rig = Rig::new(config)?;
        Ok(WebRig { rig })
    }

    /// Publish a detector batch: an array of poses indexed by pose id
    #[wasm_bindgen(js_name = pushPoses)]
    pub fn push_poses(&mut self, poses: JsValue) -> Result<usize, JsError> {
        let poses: Vec<Pose> = serde_wasm_bindgen::from_value(poses)?;
        Ok(self.rig.publish(poses))
    }

    /// Advance one frame; false once everything has settled
    pub fn tick(&mut self) -> bool {
        self.rig.tick()
    }

    #[wasm_bindgen(js_name = treeCount)]
    pub fn tree_count(&self) -> usize {
        self.rig.trees().len()
    }

    #[wasm_bindgen(js_name = limbCount)]
    pub fn limb_count(&self) -> usize {
        self.rig.limbs().len()
    }

    /// World matrices of every bone of every tree
    #[wasm_bindgen(js_name = boneMatrices)]
    pub fn bone_matrices(&mut self) -> Vec<f32> {
        bytemuck::cast_slice(&self.rig.bone_world_matrices()).to_vec()
    }

    /// Interleaved vertex buffer: position, normal, joints (u32), weights
    #[wasm_bindgen(js_name = limbVertices)]
    pub fn limb_vertices(&self, limb: usize) -> Result<Vec<u8>, JsError> {
        Ok(self.limb(limb)?.mesh().vertex_bytes().to_vec())
    }

    #[wasm_bindgen(js_name = limbIndices)]
    pub fn limb_indices(&self, limb: usize) -> Result<Vec<u32>, JsError> {
        Ok(self.limb(limb)?.mesh().indices.clone())
    }

    #[wasm_bindgen(js_name = jointMatrices)]
    pub fn joint_matrices(&mut self, limb: usize) -> Result<Vec<f32>, JsError> {
        let matrices = self
            .rig
            .joint_matrices(limb)
            .ok_or_else(|| no_such_limb(limb))?;
        Ok(bytemuck::cast_slice(&matrices).to_vec())
    }

    /// CPU-skinned world positions, xyz per vertex
    #[wasm_bindgen(js_name = skinPositions)]
    pub fn skin_positions(&mut self, limb: usize) -> Result<Vec<f32>, JsError> {
        let positions = self
            .rig
            .skin_positions(limb)
            .ok_or_else(|| no_such_limb(limb))?;
        Ok(positions.iter().flat_map(|p| p.to_array()).collect())
    }
}

impl WebRig {
    fn limb(&self, limb: usize) -> Result<&SkinnedLimb, JsError> {
        self.rig.limbs().get(limb).ok_or_else(|| no_such_limb(limb))
    }
}

fn no_such_limb(limb: usize) -> JsError {
    JsError::new(&format!("no skinned limb {}", limb))
}
