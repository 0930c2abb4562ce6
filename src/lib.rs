//! Geometry acceleration for a versioned building-model store.
//!
//! `geometry-accel` derives three structures from stored revisions and keeps
//! them in bounded, compute-once caches:
//!
//! - a loose octree over element bounding boxes ([`spatial::Octree`])
//! - a density threshold that caps loaded triangles ([`selection::DensityThreshold`])
//! - a reuse set of geometry blobs shared between elements ([`selection::ReuseSet`])
//!
//! The store is reached only through the read-only [`store::ModelStore`]
//! trait. [`GeometryAccelerator`] is the entry point.

pub mod accelerator;
pub mod cache;
pub mod selection;
pub mod spatial;
pub mod store;
pub mod types;

pub use accelerator::{AcceleratorError, GeometryAccelerator};
pub use cache::AcceleratorConfig;
