use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::{ElementId, RevisionId};

/// Octree payload: one model element with geometry.
///
/// Ordered densest first, then by triangle count (largest first), then by
/// element and revision id. Sorting a node therefore yields the objects a
/// client should stream first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeometryObject {
    pub element_id: ElementId,
    pub revision_id: RevisionId,
    pub triangles: u64,
    pub density: f32,
}

impl GeometryObject {
    pub fn new(element_id: ElementId, revision_id: RevisionId, triangles: u64, density: f32) -> Self {
        Self {
            element_id,
            revision_id,
            triangles,
            density,
        }
    }
}

impl Ord for GeometryObject {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .density
            .total_cmp(&self.density)
            .then_with(|| other.triangles.cmp(&self.triangles))
            .then_with(|| self.element_id.cmp(&other.element_id))
            .then_with(|| self.revision_id.cmp(&other.revision_id))
    }
}

impl PartialOrd for GeometryObject {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GeometryObject {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GeometryObject {}
