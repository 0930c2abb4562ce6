use std::cmp::Ordering;

use super::reuse::ReuseObject;

/// Orders reuse candidates by how many triangles reusing them saves.
pub trait SavingsRanker {
    fn savings(&self, object: &ReuseObject) -> u64;

    /// Candidates in descending savings order, ties by ascending geometry id.
    fn rank<'a, I>(&self, objects: I) -> Vec<&'a ReuseObject>
    where
        I: IntoIterator<Item = &'a ReuseObject>,
    {
        let mut ranked: Vec<&ReuseObject> = objects.into_iter().collect();
        ranked.sort_by(|a, b| {
            let savings_cmp = self.savings(b).cmp(&self.savings(a));
            if savings_cmp != Ordering::Equal {
                savings_cmp
            } else {
                a.geometry_data_id.cmp(&b.geometry_data_id)
            }
        });

        debug_assert!(ranked.windows(2).all(|w| {
            let (a, b) = (self.savings(w[0]), self.savings(w[1]));
            a > b || (a == b && w[0].geometry_data_id <= w[1].geometry_data_id)
        }));
        ranked
    }
}

/// v0: every occurrence after the first avoids one download of the blob.
/// savings := (count - 1) * primitive_count
#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceSavings;

impl SavingsRanker for InstanceSavings {
    fn savings(&self, object: &ReuseObject) -> u64 {
        u64::from(object.count.saturating_sub(1)).saturating_mul(u64::from(object.primitive_count))
    }
}
