//! SpatialNode - one cell of the loose octree.
//!
//! Nodes are stored in the octree arena and refer to their children by arena
//! index. A node's id is derived from its parent's id and its octant, so two
//! trees built over the same bounds assign the same id to the same cell.

use serde::{Deserialize, Serialize};

use super::bounds::Bounds;

/// Index of a node in the octree arena.
pub(crate) type NodeIndex = usize;

/// A stored value together with the bounds it was inserted with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry<V> {
    pub bounds: Bounds,
    pub value: V,
}

/// One octree cell.
#[derive(Debug, Clone)]
pub struct SpatialNode<V> {
    id: u64,
    level: u32,
    bounds: Bounds,
    deepest_level: u32,
    pub(crate) children: [Option<NodeIndex>; 8],
    pub(crate) values: Vec<Entry<V>>,
}

impl<V> SpatialNode<V> {
    pub(crate) fn root(bounds: Bounds) -> Self {
        Self::new(0, 0, bounds)
    }

    pub(crate) fn new(id: u64, level: u32, bounds: Bounds) -> Self {
        Self {
            id,
            level,
            bounds,
            deepest_level: level,
            children: [None; 8],
            values: Vec::new(),
        }
    }

    /// Id of the child in octant `(x, y, z)`: `parent * 8 + (x*4 + y*2 + z + 1)`.
    #[inline]
    pub fn child_id(parent_id: u64, x: u8, y: u8, z: u8) -> u64 {
        parent_id * 8 + u64::from(x * 4 + y * 2 + z + 1)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Deepest level at which a value was stored in this subtree. Equals the
    /// node's own level until something lands below it.
    pub fn deepest_level(&self) -> u32 {
        self.deepest_level
    }

    pub(crate) fn record_depth(&mut self, level: u32) {
        if level > self.deepest_level {
            self.deepest_level = level;
        }
    }

    /// Values stored directly in this node.
    pub fn values(&self) -> &[Entry<V>] {
        &self.values
    }

    /// Number of values stored directly in this node.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    pub(crate) fn child_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.children.iter().flatten().copied()
    }
}

impl<V: Ord> SpatialNode<V> {
    /// Sort local values by the payload order. Stable, so repeating it is a
    /// no-op.
    pub fn sort(&mut self) {
        self.values.sort_by(|a, b| a.value.cmp(&b.value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_ids_are_one_through_eight_under_root() {
        let mut ids = Vec::new();
        for x in 0..=1 {
            for y in 0..=1 {
                for z in 0..=1 {
                    ids.push(SpatialNode::<()>::child_id(0, x, y, z));
                }
            }
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_child_id_of_child() {
        // Octant (1, 1, 1) of node 8 is 8 * 8 + 8.
        assert_eq!(SpatialNode::<()>::child_id(8, 1, 1, 1), 72);
        assert_eq!(SpatialNode::<()>::child_id(1, 0, 0, 0), 9);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let bounds = Bounds::from_arrays([0.0; 3], [1.0; 3]);
        let mut node = SpatialNode::root(bounds);
        for value in [5, 3, 9, 3, 1] {
            node.values.push(Entry { bounds, value });
        }

        node.sort();
        let once: Vec<i32> = node.values().iter().map(|e| e.value).collect();
        node.sort();
        let twice: Vec<i32> = node.values().iter().map(|e| e.value).collect();

        assert_eq!(once, vec![1, 3, 3, 5, 9]);
        assert_eq!(once, twice);
    }
}
