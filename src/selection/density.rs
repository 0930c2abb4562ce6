use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::SelectionError;

/// One entry of a revision's density histogram.
///
/// Entries are stored densest first. `triangles_below` counts the triangles of
/// `type_name` geometry at this density level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Density {
    pub type_name: String,
    pub density: f32,
    pub triangles_below: u64,
    pub triangles_above: u64,
}

impl Density {
    pub fn new(type_name: impl Into<String>, density: f32, triangles_below: u64) -> Self {
        Self {
            type_name: type_name.into(),
            density,
            triangles_below,
            triangles_above: 0,
        }
    }
}

/// The density a client should load at to stay near a triangle budget,
/// with exact counts of what that choice loads and skips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityThreshold {
    pub density: f32,
    pub type_name: String,
    /// Triangles loaded when using this threshold.
    pub triangles_below: u64,
    /// Triangles skipped when using this threshold.
    pub triangles_above: u64,
}

enum Phase {
    Accumulating,
    Above { threshold: f32 },
}

/// Pick the coarsest density whose cumulative triangle count exceeds
/// `nr_triangles`, skipping histogram entries whose type is excluded.
///
/// Entries at exactly the chosen density are all counted as loaded. When no
/// entry survives the exclusions the first histogram entry is returned with
/// its stored counters.
pub fn select_density_threshold(
    densities: &[Density],
    nr_triangles: u64,
    excluded_types: &BTreeSet<String>,
) -> Result<DensityThreshold, SelectionError> {
    let first = densities.first().ok_or(SelectionError::EmptyHistogram)?;

    let mut phase = Phase::Accumulating;
    let mut cumulative_below: u64 = 0;
    let mut cumulative_above: u64 = 0;
    let mut chosen: Option<&Density> = None;

    for density in densities {
        if excluded_types.contains(&density.type_name) {
            continue;
        }
        match phase {
            Phase::Accumulating => {
                cumulative_below = cumulative_below.saturating_add(density.triangles_below);
                chosen = Some(density);
                if cumulative_below > nr_triangles {
                    phase = Phase::Above {
                        threshold: density.density,
                    };
                }
            }
            Phase::Above { threshold } => {
                if density.density == threshold {
                    cumulative_below = cumulative_below.saturating_add(density.triangles_below);
                    chosen = Some(density);
                } else {
                    cumulative_above = cumulative_above.saturating_add(density.triangles_below);
                }
            }
        }
    }

    let threshold = match chosen {
        Some(density) => DensityThreshold {
            density: density.density,
            type_name: density.type_name.clone(),
            triangles_below: cumulative_below,
            triangles_above: cumulative_above,
        },
        None => DensityThreshold {
            density: first.density,
            type_name: first.type_name.clone(),
            triangles_below: first.triangles_below,
            triangles_above: first.triangles_above,
        },
    };
    Ok(threshold)
}
