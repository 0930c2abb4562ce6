pub mod identifiers;
pub mod keys;

pub use identifiers::{ElementId, GeometryDataId, RevisionId};
pub use keys::{DensityThresholdKey, OctreeKey, ReuseKey};
