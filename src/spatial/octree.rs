//! Loose octree over axis-aligned boxes.
//!
//! Values descend into the first child octant that fully contains their
//! bounds and stop at the shallowest node where no single octant does, so a
//! value straddling an octant boundary stays with the enclosing node.
//!
//! ```text
//! level 0          [0]
//!                 /   \
//! level 1      [1] ... [8]          id = parent * 8 + (x*4 + y*2 + z + 1)
//!             /   \
//! level 2  [9] ... [16]
//! ```

use std::collections::{HashMap, VecDeque};

use super::bounds::Bounds;
use super::node::{Entry, NodeIndex, SpatialNode};

/// Deepest level an octree may be built to. Node ids grow by a factor of 8
/// per level and must fit in a `u64`.
pub const MAX_SUPPORTED_DEPTH: u32 = 20;

#[derive(Debug, Clone)]
pub struct Octree<V> {
    nodes: Vec<SpatialNode<V>>,
    registry: HashMap<u64, NodeIndex>,
    max_depth: u32,
    size: usize,
}

impl<V> Octree<V> {
    const ROOT: NodeIndex = 0;

    /// Create an empty tree covering `bounds`.
    ///
    /// # Panics
    /// Debug-asserts that `max_depth <= MAX_SUPPORTED_DEPTH`.
    pub fn new(bounds: Bounds, max_depth: u32) -> Self {
        debug_assert!(
            max_depth <= MAX_SUPPORTED_DEPTH,
            "max depth {max_depth} exceeds {MAX_SUPPORTED_DEPTH}"
        );
        let mut registry = HashMap::new();
        registry.insert(0, Self::ROOT);
        Self {
            nodes: vec![SpatialNode::root(bounds)],
            registry,
            max_depth,
            size: 0,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        self.root().bounds()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn root(&self) -> &SpatialNode<V> {
        &self.nodes[Self::ROOT]
    }

    /// Look a node up by its id.
    pub fn node(&self, id: u64) -> Option<&SpatialNode<V>> {
        self.registry.get(&id).map(|&index| &self.nodes[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest level any value has been stored at.
    pub fn deepest_level(&self) -> u32 {
        self.root().deepest_level()
    }

    /// Total number of stored values.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Ids of the existing children of node `id`, in octant order.
    pub fn children(&self, id: u64) -> Vec<u64> {
        match self.registry.get(&id) {
            Some(&index) => self.nodes[index]
                .child_indices()
                .map(|child| self.nodes[child].id())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Insert `value` and return the level it was stored at.
    pub fn insert(&mut self, value: V, bounds: Bounds) -> u32 {
        let mut path = Vec::with_capacity(self.max_depth as usize + 1);
        let mut current = Self::ROOT;

        'descend: loop {
            path.push(current);
            let level = self.nodes[current].level();
            if level == self.max_depth {
                break;
            }
            for x in 0..=1u8 {
                for y in 0..=1u8 {
                    for z in 0..=1u8 {
                        let octant = self.nodes[current].bounds().offset(x, y, z);
                        if bounds.within(&octant) {
                            current = self.child_or_insert(current, x, y, z, octant);
                            continue 'descend;
                        }
                    }
                }
            }
            break;
        }

        let stored_at = self.nodes[current].level();
        self.nodes[current].values.push(Entry { bounds, value });
        for index in path {
            self.nodes[index].record_depth(stored_at);
        }
        self.size += 1;
        stored_at
    }

    fn child_or_insert(&mut self, parent: NodeIndex, x: u8, y: u8, z: u8, bounds: Bounds) -> NodeIndex {
        let slot = usize::from(x * 4 + y * 2 + z);
        if let Some(child) = self.nodes[parent].children[slot] {
            return child;
        }
        let parent_node = &self.nodes[parent];
        let id = SpatialNode::<V>::child_id(parent_node.id(), x, y, z);
        let child = SpatialNode::new(id, parent_node.level() + 1, bounds);

        let index = self.nodes.len();
        self.nodes.push(child);
        self.nodes[parent].children[slot] = Some(index);
        self.registry.insert(id, index);
        index
    }

    /// Candidate values for `window`: everything stored in a node whose bounds
    /// overlap the window. Values in nodes that do not overlap are never
    /// returned; values of a visited node are returned without a per-value
    /// check.
    pub fn query(&self, window: &Bounds) -> Vec<&V> {
        let mut results = Vec::new();
        self.query_node(Self::ROOT, window, &mut results);
        results
    }

    fn query_node<'a>(&'a self, index: NodeIndex, window: &Bounds, results: &mut Vec<&'a V>) {
        let node = &self.nodes[index];
        if !node.bounds().overlaps(window) {
            return;
        }
        results.extend(node.values().iter().map(|entry| &entry.value));
        for child in node.child_indices() {
            self.query_node(child, window, results);
        }
    }

    /// Apply `op` to nodes in breadth-first order. With `Some(level)` only
    /// nodes at that level are visited; with `None` every node is.
    pub fn traverse_breadth_first<F>(&mut self, level: Option<u32>, mut op: F)
    where
        F: FnMut(&mut SpatialNode<V>),
    {
        for index in self.breadth_first_order(level) {
            let node = &mut self.nodes[index];
            if level.map_or(true, |wanted| node.level() == wanted) {
                op(node);
            }
        }
    }

    /// Read-only breadth-first visit, same selection rules as
    /// [`Octree::traverse_breadth_first`].
    pub fn visit_breadth_first<F>(&self, level: Option<u32>, mut op: F)
    where
        F: FnMut(&SpatialNode<V>),
    {
        for index in self.breadth_first_order(level) {
            let node = &self.nodes[index];
            if level.map_or(true, |wanted| node.level() == wanted) {
                op(node);
            }
        }
    }

    /// Arena indices in breadth-first order, not descending below `level`.
    fn breadth_first_order(&self, level: Option<u32>) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([Self::ROOT]);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            let node = &self.nodes[index];
            if level.map_or(true, |wanted| node.level() < wanted) {
                queue.extend(node.child_indices());
            }
        }
        order
    }
}

impl<V: Ord> Octree<V> {
    /// Sort the values of every node by the payload order.
    pub fn sort_nodes(&mut self) {
        self.traverse_breadth_first(None, SpatialNode::sort);
    }
}
