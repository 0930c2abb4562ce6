// Cache loaders. Each one opens its own read session, which is dropped before
// the built structure (or the error) is handed back to the cache.

use std::collections::BTreeSet;

use super::AcceleratorError;
use crate::cache::AcceleratorConfig;
use crate::selection::{select_density_threshold, DensityThreshold, ReuseSet};
use crate::spatial::{Bounds, GeometryObject, Octree};
use crate::store::{ElementQuery, GeometryField, ModelStore, ReadSession, StoreError, TypeHandle};
use crate::types::identifiers::RevisionId;
use crate::types::keys::{DensityThresholdKey, OctreeKey, ReuseKey};

fn resolve_type<S: ReadSession>(
    session: &S,
    schema: &str,
    type_name: &str,
) -> Result<TypeHandle, AcceleratorError> {
    session
        .resolve_type(schema, type_name)?
        .ok_or_else(|| AcceleratorError::QueryConstruction {
            schema: schema.to_string(),
            type_name: type_name.to_string(),
        })
}

/// Query for every element of the configured spatial base type (subtypes
/// included) in `revision_ids`, minus the excluded types.
fn spatial_element_query<S: ReadSession>(
    session: &S,
    config: &AcceleratorConfig,
    schema: &str,
    excluded_types: &BTreeSet<String>,
    revision_ids: &BTreeSet<RevisionId>,
) -> Result<ElementQuery, AcceleratorError> {
    let base_type = resolve_type(session, schema, &config.spatial_base_type)?;
    let excluded = excluded_types
        .iter()
        .map(|type_name| resolve_type(session, schema, type_name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElementQuery::new(schema, base_type, revision_ids.clone()).exclude(excluded))
}

fn first_revision(revision_ids: &BTreeSet<RevisionId>) -> Result<RevisionId, AcceleratorError> {
    revision_ids
        .first()
        .copied()
        .ok_or_else(|| AcceleratorError::EmptyInput("no revisions requested".into()))
}

pub(crate) fn octree<S: ModelStore>(
    store: &S,
    config: &AcceleratorConfig,
    key: &OctreeKey,
) -> Result<Octree<GeometryObject>, AcceleratorError> {
    let _span = tracing::info_span!("accelerator::build_octree").entered();
    let first = first_revision(key.revision_ids())?;
    let session = store.open_read_session()?;

    // All revisions are assumed to share the schema of the first one.
    let mut total_bounds = Bounds::empty();
    let mut schema = None;
    for &revision_id in key.revision_ids() {
        let revision = session.revision(revision_id)?;
        total_bounds.integrate(&revision.bounds_mm);
        if revision_id == first {
            schema = Some(revision.schema);
        }
    }
    let schema = schema.ok_or(StoreError::RevisionNotFound(first))?;

    let query = spatial_element_query(&session, config, &schema, key.excluded_types(), key.revision_ids())?
        .include(GeometryField::Geometry)
        .include(GeometryField::GeometryBounds)
        .include(GeometryField::GeometryData)
        .include(GeometryField::GeometryDataBounds);

    let mut octree = Octree::new(total_bounds, key.max_depth());
    let mut scanned = 0usize;
    for record in session.query(&query)? {
        let record = record?;
        scanned += 1;
        let Some(geometry) = record.geometry else {
            continue;
        };
        if geometry.density < key.min_density() {
            continue;
        }
        // Reused geometry is sent once and instanced, so it must be bounded
        // by every placement of the blob, not by this element alone.
        let bounds = if key.geometry_ids_to_reuse().contains(&geometry.data_id) {
            geometry.data_bounds_mm
        } else {
            geometry.bounds_mm
        };
        let Some(bounds) = bounds else {
            continue;
        };
        let object = GeometryObject::new(
            record.element_id,
            record.revision_id,
            geometry.saveable_triangles,
            geometry.density,
        );
        octree.insert(object, bounds);
    }
    drop(session);

    octree.sort_nodes();

    tracing::debug!(
        revisions = key.revision_ids().len(),
        scanned,
        inserted = octree.size(),
        nodes = octree.node_count(),
        deepest_level = octree.deepest_level(),
        "octree built"
    );
    Ok(octree)
}

pub(crate) fn density_threshold<S: ModelStore>(
    store: &S,
    key: &DensityThresholdKey,
) -> Result<DensityThreshold, AcceleratorError> {
    let _span = tracing::info_span!("accelerator::build_density_threshold").entered();
    let session = store.open_read_session()?;
    let revision = session.revision(key.revision_id())?;
    drop(session);

    let threshold = select_density_threshold(&revision.densities, key.nr_triangles(), key.excluded_types())?;

    tracing::debug!(
        revision = %key.revision_id(),
        requested = key.nr_triangles(),
        density = threshold.density,
        triangles_below = threshold.triangles_below,
        triangles_above = threshold.triangles_above,
        "density threshold selected"
    );
    Ok(threshold)
}

pub(crate) fn reuse_set<S: ModelStore>(
    store: &S,
    config: &AcceleratorConfig,
    key: &ReuseKey,
) -> Result<ReuseSet, AcceleratorError> {
    let _span = tracing::info_span!("accelerator::build_reuse_set").entered();
    let first = first_revision(key.revision_ids())?;
    let session = store.open_read_session()?;

    let schema = session.revision(first)?.schema;
    let query = spatial_element_query(&session, config, &schema, key.excluded_types(), key.revision_ids())?
        .include(GeometryField::Geometry);

    let mut reuse_set = ReuseSet::new();
    for record in session.query(&query)? {
        if let Some(geometry) = record?.geometry {
            reuse_set.add_occurrence(geometry.data_id, geometry.primitive_count);
        }
    }
    drop(session);

    tracing::debug!(
        revisions = key.revision_ids().len(),
        geometry_blobs = reuse_set.len(),
        shared = reuse_set.shared_count(),
        "reuse set built"
    );
    Ok(reuse_set)
}
