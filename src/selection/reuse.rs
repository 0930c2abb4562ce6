use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::budgeting::{apply_savings_budget, BudgetResult};
use super::ranking::{InstanceSavings, SavingsRanker};
use crate::types::identifiers::GeometryDataId;

/// A geometry blob and how often it is referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReuseObject {
    pub geometry_data_id: GeometryDataId,
    pub count: u32,
    pub primitive_count: u32,
}

impl ReuseObject {
    pub fn new(geometry_data_id: GeometryDataId, primitive_count: u32) -> Self {
        Self {
            geometry_data_id,
            count: 1,
            primitive_count,
        }
    }

    pub fn inc(&mut self) {
        self.count = self.count.saturating_add(1);
    }
}

/// Geometry blobs of a set of revisions, grouped by id.
///
/// Built once from the element stream; afterwards only queried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReuseSet {
    objects: BTreeMap<GeometryDataId, ReuseObject>,
}

impl ReuseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `(geometry id, primitive count)` occurrences.
    pub fn from_occurrences<I>(occurrences: I) -> Self
    where
        I: IntoIterator<Item = (GeometryDataId, u32)>,
    {
        let mut set = Self::new();
        for (geometry_data_id, primitive_count) in occurrences {
            set.add_occurrence(geometry_data_id, primitive_count);
        }
        set
    }

    /// Record one element referencing `geometry_data_id`. The primitive count
    /// of the first occurrence is kept.
    pub fn add_occurrence(&mut self, geometry_data_id: GeometryDataId, primitive_count: u32) {
        self.objects
            .entry(geometry_data_id)
            .and_modify(ReuseObject::inc)
            .or_insert_with(|| ReuseObject::new(geometry_data_id, primitive_count));
    }

    pub fn get(&self, geometry_data_id: GeometryDataId) -> Option<&ReuseObject> {
        self.objects.get(&geometry_data_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReuseObject> {
        self.objects.values()
    }

    /// Number of blobs referenced by more than one element.
    pub fn shared_count(&self) -> usize {
        self.objects.values().filter(|object| object.count > 1).count()
    }

    /// Rank the blobs and take the best ones until `triangles_to_save`
    /// triangles are saved.
    pub fn select<R: SavingsRanker>(&self, ranker: &R, triangles_to_save: u64) -> BudgetResult {
        let ranked = ranker.rank(self.objects.values());
        apply_savings_budget(ranker, &ranked, triangles_to_save)
    }

    /// Ids of the geometry a client should fetch once and instance, using the
    /// default savings estimate.
    pub fn geometry_data_ids_to_reuse(&self, triangles_to_save: u64) -> BTreeSet<GeometryDataId> {
        self.select(&InstanceSavings, triangles_to_save).selected
    }
}
