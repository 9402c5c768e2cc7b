use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::tube::{TubeMesh, TubeParams};

/// Scale rounded to a fixed precision so nearly equal floats share a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScaleKey(i64);

impl ScaleKey {
    const PRECISION: f64 = 1e6;

    fn new(scale: f32) -> Self {
        Self((scale as f64 * Self::PRECISION).round() as i64)
    }
}

/// Tube templates keyed by tree scale.
///
/// Every tree of a rig shares the same tube shape apart from its radius, so
/// one template per distinct scale is built and callers get their own copy.
#[derive(Debug)]
pub struct SkinMeshCache {
    params: TubeParams,
    templates: Mutex<HashMap<ScaleKey, Arc<TubeMesh>>>,
}

impl SkinMeshCache {
    pub fn new(params: TubeParams) -> Self {
        Self {
            params,
            templates: Mutex::new(HashMap::new()),
        }
    }

    pub fn params(&self) -> &TubeParams {
        &self.params
    }

    /// Shared template for `scale`, building it on first use
    pub fn template(&self, scale: f32) -> Arc<TubeMesh> {
        let mut templates = self.templates.lock();
        templates
            .entry(ScaleKey::new(scale))
            .or_insert_with(|| {
                log::debug!("Building tube template for scale {}", scale);
                Arc::new(TubeMesh::build(&self.params, scale))
            })
            .clone()
    }

    /// Independent copy of the mesh for `scale`
    pub fn get(&self, scale: f32) -> TubeMesh {
        TubeMesh::clone(&self.template(scale))
    }

    pub fn is_cached(&self, scale: f32) -> bool {
        self.templates.lock().contains_key(&ScaleKey::new(scale))
    }

    pub fn template_count(&self) -> usize {
        self.templates.lock().len()
    }
}
