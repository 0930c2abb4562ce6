use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ranking::SavingsRanker;
use super::reuse::ReuseObject;
use crate::types::identifiers::GeometryDataId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetResult {
    pub selected: BTreeSet<GeometryDataId>,
    pub triangles_saved: u64,
    pub candidates_considered: usize,
    /// Candidates that occur once and so save nothing.
    pub candidates_without_savings: usize,
}

/// Walk `ranked` and take ids until the saved triangle count reaches
/// `triangles_to_save`. Ids that save nothing are never taken.
pub fn apply_savings_budget<R: SavingsRanker>(
    ranker: &R,
    ranked: &[&ReuseObject],
    triangles_to_save: u64,
) -> BudgetResult {
    let mut selected = BTreeSet::new();
    let mut triangles_saved = 0u64;

    for object in ranked {
        if triangles_saved >= triangles_to_save {
            break;
        }
        let savings = ranker.savings(object);
        if savings == 0 {
            continue;
        }
        selected.insert(object.geometry_data_id);
        triangles_saved = triangles_saved.saturating_add(savings);
    }

    let candidates_without_savings = ranked
        .iter()
        .filter(|object| ranker.savings(object) == 0)
        .count();

    BudgetResult {
        selected,
        triangles_saved,
        candidates_considered: ranked.len(),
        candidates_without_savings,
    }
}
