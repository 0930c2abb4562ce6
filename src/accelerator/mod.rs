//! The geometry accelerator: three memoized, derived views of stored revisions.
//!
//! - octrees over element bounds, for windowed and level-of-detail streaming
//! - density thresholds that keep a load near a triangle budget
//! - reuse sets of geometry blobs shared between elements
//!
//! Each view is built on first request for its key and cached. Concurrent
//! requests for the same key wait for a single build and share its result,
//! error included. Failed builds are logged and not cached, so a request
//! made after the failure builds again.

mod build;

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::{AcceleratorConfig, CacheStats, ConfigError, LoadingCache};
use crate::selection::{DensityThreshold, ReuseSet, SelectionError};
use crate::spatial::{GeometryObject, Octree, MAX_SUPPORTED_DEPTH};
use crate::store::{ModelStore, StoreError};
use crate::types::identifiers::{GeometryDataId, RevisionId};
use crate::types::keys::{DensityThresholdKey, OctreeKey, ReuseKey};

#[derive(Debug, Clone, Error)]
pub enum AcceleratorError {
    #[error("Store access failed: {0}")]
    StoreAccess(#[from] StoreError),
    #[error("Cannot build query: type {type_name} not found in schema {schema}")]
    QueryConstruction { schema: String, type_name: String },
    #[error("Nothing to build from: {0}")]
    EmptyInput(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<SelectionError> for AcceleratorError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::EmptyHistogram => AcceleratorError::EmptyInput(err.to_string()),
        }
    }
}

pub struct GeometryAccelerator<S> {
    store: S,
    config: AcceleratorConfig,
    octrees: LoadingCache<OctreeKey, Octree<GeometryObject>, AcceleratorError>,
    density_thresholds: LoadingCache<DensityThresholdKey, DensityThreshold, AcceleratorError>,
    reuse_sets: LoadingCache<ReuseKey, ReuseSet, AcceleratorError>,
}

impl<S: ModelStore> GeometryAccelerator<S> {
    pub fn new(store: S) -> Self {
        Self::build(store, AcceleratorConfig::v0())
    }

    pub fn with_config(store: S, config: AcceleratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(store, config))
    }

    fn build(store: S, config: AcceleratorConfig) -> Self {
        Self {
            octrees: LoadingCache::new("octrees", config.octree_cache_size),
            density_thresholds: LoadingCache::new("density_thresholds", config.density_cache_size),
            reuse_sets: LoadingCache::new("reuse_sets", config.reuse_cache_size),
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AcceleratorConfig {
        &self.config
    }

    /// Octree over the elements of `revision_ids` whose density is at least
    /// `min_density`. Elements whose geometry id is in
    /// `geometry_ids_to_reuse` are indexed by the bounds of every placement
    /// of that geometry.
    pub fn get_octree<R, T, N, G>(
        &self,
        revision_ids: R,
        excluded_types: T,
        geometry_ids_to_reuse: G,
        max_depth: u32,
        min_density: f32,
        max_density: f32,
    ) -> Result<Arc<Octree<GeometryObject>>, AcceleratorError>
    where
        R: IntoIterator<Item = RevisionId>,
        T: IntoIterator<Item = N>,
        N: Into<String>,
        G: IntoIterator<Item = GeometryDataId>,
    {
        let key = OctreeKey::new(
            revision_ids,
            excluded_types,
            geometry_ids_to_reuse,
            max_depth,
            min_density,
            max_density,
        );
        self.octree(&key)
    }

    pub fn octree(&self, key: &OctreeKey) -> Result<Arc<Octree<GeometryObject>>, AcceleratorError> {
        if key.max_depth() > MAX_SUPPORTED_DEPTH {
            return Err(AcceleratorError::InvalidRequest(format!(
                "max depth {} exceeds {}",
                key.max_depth(),
                MAX_SUPPORTED_DEPTH
            )));
        }
        self.octrees.get_or_try_load(key, |key| {
            build::octree(&self.store, &self.config, key).map_err(|err| {
                tracing::error!(?key, error = %err, "octree build failed");
                err
            })
        })
    }

    /// Geometry ids worth sending once and instancing, best first, until
    /// `triangles_to_save` triangles are saved.
    pub fn get_geometry_data_to_reuse<R, T, N>(
        &self,
        revision_ids: R,
        excluded_types: T,
        triangles_to_save: u64,
    ) -> Result<BTreeSet<GeometryDataId>, AcceleratorError>
    where
        R: IntoIterator<Item = RevisionId>,
        T: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let key = ReuseKey::new(revision_ids, excluded_types);
        let reuse_set = self.reuse_set(&key)?;
        Ok(reuse_set.geometry_data_ids_to_reuse(triangles_to_save))
    }

    pub fn reuse_set(&self, key: &ReuseKey) -> Result<Arc<ReuseSet>, AcceleratorError> {
        self.reuse_sets.get_or_try_load(key, |key| {
            build::reuse_set(&self.store, &self.config, key).map_err(|err| {
                tracing::error!(?key, error = %err, "reuse set build failed");
                err
            })
        })
    }

    /// Density at which loading `revision_id` stays near `nr_triangles`.
    pub fn get_density_threshold<T, N>(
        &self,
        revision_id: RevisionId,
        nr_triangles: u64,
        excluded_types: T,
    ) -> Result<Arc<DensityThreshold>, AcceleratorError>
    where
        T: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let key = DensityThresholdKey::new(revision_id, nr_triangles, excluded_types);
        self.density_threshold(&key)
    }

    pub fn density_threshold(&self, key: &DensityThresholdKey) -> Result<Arc<DensityThreshold>, AcceleratorError> {
        self.density_thresholds.get_or_try_load(key, |key| {
            build::density_threshold(&self.store, key).map_err(|err| {
                tracing::error!(?key, error = %err, "density threshold build failed");
                err
            })
        })
    }

    pub fn octree_cache_stats(&self) -> CacheStats {
        self.octrees.stats()
    }

    pub fn density_cache_stats(&self) -> CacheStats {
        self.density_thresholds.stats()
    }

    pub fn reuse_cache_stats(&self) -> CacheStats {
        self.reuse_sets.stats()
    }

    /// Drop every cached structure. Builds in flight finish for their
    /// callers but are not kept.
    pub fn invalidate_all(&self) {
        self.octrees.invalidate_all();
        self.density_thresholds.invalidate_all();
        self.reuse_sets.invalidate_all();
    }
}
