use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::types::identifiers::{GeometryDataId, RevisionId};

// Cache keys.
// Sets are ordered so two keys built from the same parameters compare and
// hash equal no matter what order the caller listed them in.

fn collect_names<T, S>(names: T) -> BTreeSet<String>
where
    T: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

/// Bit pattern used for equality and hashing of float parameters.
/// `-0.0` and `0.0` select the same objects, so they share a key.
fn float_key(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

/// Identifies one octree build.
#[derive(Debug, Clone)]
pub struct OctreeKey {
    revision_ids: BTreeSet<RevisionId>,
    excluded_types: BTreeSet<String>,
    geometry_ids_to_reuse: BTreeSet<GeometryDataId>,
    max_depth: u32,
    min_density: f32,
    max_density: f32,
}

impl OctreeKey {
    /// An absent exclusion set is the same request as an empty one.
    pub fn new<R, T, S, G>(
        revision_ids: R,
        excluded_types: T,
        geometry_ids_to_reuse: G,
        max_depth: u32,
        min_density: f32,
        max_density: f32,
    ) -> Self
    where
        R: IntoIterator<Item = RevisionId>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
        G: IntoIterator<Item = GeometryDataId>,
    {
        Self {
            revision_ids: revision_ids.into_iter().collect(),
            excluded_types: collect_names(excluded_types),
            geometry_ids_to_reuse: geometry_ids_to_reuse.into_iter().collect(),
            max_depth,
            min_density,
            max_density,
        }
    }

    pub fn revision_ids(&self) -> &BTreeSet<RevisionId> {
        &self.revision_ids
    }

    pub fn excluded_types(&self) -> &BTreeSet<String> {
        &self.excluded_types
    }

    pub fn geometry_ids_to_reuse(&self) -> &BTreeSet<GeometryDataId> {
        &self.geometry_ids_to_reuse
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn min_density(&self) -> f32 {
        self.min_density
    }

    /// Part of the key only; the octree build does not filter on it.
    pub fn max_density(&self) -> f32 {
        self.max_density
    }
}

impl PartialEq for OctreeKey {
    fn eq(&self, other: &Self) -> bool {
        self.revision_ids == other.revision_ids
            && self.excluded_types == other.excluded_types
            && self.geometry_ids_to_reuse == other.geometry_ids_to_reuse
            && self.max_depth == other.max_depth
            && float_key(self.min_density) == float_key(other.min_density)
            && float_key(self.max_density) == float_key(other.max_density)
    }
}

impl Eq for OctreeKey {}

impl Hash for OctreeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.revision_ids.hash(state);
        self.excluded_types.hash(state);
        self.geometry_ids_to_reuse.hash(state);
        self.max_depth.hash(state);
        float_key(self.min_density).hash(state);
        float_key(self.max_density).hash(state);
    }
}

/// Identifies one density threshold computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DensityThresholdKey {
    revision_id: RevisionId,
    nr_triangles: u64,
    excluded_types: BTreeSet<String>,
}

impl DensityThresholdKey {
    pub fn new<T, S>(revision_id: RevisionId, nr_triangles: u64, excluded_types: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            revision_id,
            nr_triangles,
            excluded_types: collect_names(excluded_types),
        }
    }

    pub fn revision_id(&self) -> RevisionId {
        self.revision_id
    }

    pub fn nr_triangles(&self) -> u64 {
        self.nr_triangles
    }

    pub fn excluded_types(&self) -> &BTreeSet<String> {
        &self.excluded_types
    }
}

/// Identifies one reuse set build. The triangle budget is applied per request
/// on the cached set, so it is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReuseKey {
    revision_ids: BTreeSet<RevisionId>,
    excluded_types: BTreeSet<String>,
}

impl ReuseKey {
    pub fn new<R, T, S>(revision_ids: R, excluded_types: T) -> Self
    where
        R: IntoIterator<Item = RevisionId>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            revision_ids: revision_ids.into_iter().collect(),
            excluded_types: collect_names(excluded_types),
        }
    }

    pub fn revision_ids(&self) -> &BTreeSet<RevisionId> {
        &self.revision_ids
    }

    pub fn excluded_types(&self) -> &BTreeSet<String> {
        &self.excluded_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn rid(raw: i64) -> RevisionId {
        RevisionId::new(raw)
    }

    #[test]
    fn octree_key_ignores_set_construction_order() {
        let a = OctreeKey::new(
            vec![rid(2), rid(1)],
            vec!["IfcSpace", "IfcOpeningElement"],
            vec![GeometryDataId::new(9), GeometryDataId::new(4)],
            3,
            0.5,
            10.0,
        );
        let b = OctreeKey::new(
            vec![rid(1), rid(2)],
            vec!["IfcOpeningElement", "IfcSpace"],
            vec![GeometryDataId::new(4), GeometryDataId::new(9)],
            3,
            0.5,
            10.0,
        );

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn octree_key_differs_on_thresholds() {
        let no_types: Vec<String> = Vec::new();
        let a = OctreeKey::new(vec![rid(1)], no_types.clone(), Vec::<GeometryDataId>::new(), 3, 0.5, 10.0);
        let b = OctreeKey::new(vec![rid(1)], no_types.clone(), Vec::<GeometryDataId>::new(), 3, 0.5, 20.0);
        let c = OctreeKey::new(vec![rid(1)], no_types, Vec::<GeometryDataId>::new(), 4, 0.5, 10.0);

        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn octree_key_treats_signed_zero_alike() {
        let no_types: Vec<String> = Vec::new();
        let a = OctreeKey::new(vec![rid(1)], no_types.clone(), Vec::<GeometryDataId>::new(), 3, 0.0, 1.0);
        let b = OctreeKey::new(vec![rid(1)], no_types, Vec::<GeometryDataId>::new(), 3, -0.0, 1.0);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn absent_exclusions_match_empty_exclusions() {
        let absent: Option<Vec<String>> = None;
        let a = ReuseKey::new(vec![rid(1)], absent.into_iter().flatten());
        let b = ReuseKey::new(vec![rid(1)], Vec::<String>::new());

        assert_eq!(a, b);
    }
}
