//! Axis-aligned bounding box in model millimetres, double precision.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with closed intervals on every axis.
///
/// A box built with [`Bounds::empty`] covers nothing and is the identity for
/// [`Bounds::integrate`], which is how per-revision boxes are merged into a
/// scene box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner (inclusive).
    pub min: DVec3,
    /// Maximum corner (inclusive).
    pub max: DVec3,
}

impl Bounds {
    /// Create a box from its corners.
    ///
    /// # Panics
    /// Debug-asserts that min <= max on all axes.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        debug_assert!(
            min.cmple(max).all(),
            "bounds min must be <= max on all axes"
        );
        Self { min, max }
    }

    pub fn from_arrays(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::new(DVec3::from_array(min), DVec3::from_array(max))
    }

    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::INFINITY),
            max: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Grow this box so it also covers `other`.
    pub fn integrate(&mut self, other: &Bounds) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Sub-box for octant `(x, y, z)`, each coordinate 0 (lower half) or 1
    /// (upper half).
    ///
    /// Halves share the centre plane, so the eight octants tile the box
    /// exactly.
    pub fn offset(&self, x: u8, y: u8, z: u8) -> Bounds {
        debug_assert!(x <= 1 && y <= 1 && z <= 1, "octant coordinates are 0 or 1");
        let center = self.center();
        let pick = |upper: u8, lo: f64, mid: f64, hi: f64| {
            if upper == 0 {
                (lo, mid)
            } else {
                (mid, hi)
            }
        };
        let (min_x, max_x) = pick(x, self.min.x, center.x, self.max.x);
        let (min_y, max_y) = pick(y, self.min.y, center.y, self.max.y);
        let (min_z, max_z) = pick(z, self.min.z, center.z, self.max.z);
        Bounds {
            min: DVec3::new(min_x, min_y, min_z),
            max: DVec3::new(max_x, max_y, max_z),
        }
    }

    /// True if this box lies completely inside `other`. Touching faces count
    /// as inside.
    #[inline]
    pub fn within(&self, other: &Bounds) -> bool {
        self.min.cmpge(other.min).all() && self.max.cmple(other.max).all()
    }

    /// True unless the boxes are separated on some axis. Touching faces
    /// overlap.
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.min.cmpgt(other.max).any() || self.max.cmplt(other.min).any())
    }

    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}
