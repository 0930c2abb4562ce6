//! Spatial indexing of element bounding boxes.
//!
//! # Module Structure
//!
//! - [`bounds`]: `Bounds` - closed axis-aligned box, octant split, union
//! - [`node`]: `SpatialNode` - one octree cell with its local values
//! - [`octree`]: `Octree` - node arena, id registry, insert/query/traversal
//! - [`object`]: `GeometryObject` - the payload the accelerator indexes

pub mod bounds;
pub mod node;
pub mod object;
pub mod octree;

pub use bounds::Bounds;
pub use node::{Entry, SpatialNode};
pub use object::GeometryObject;
pub use octree::{Octree, MAX_SUPPORTED_DEPTH};
