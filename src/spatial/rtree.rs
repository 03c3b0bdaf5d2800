//! Pointer hit testing over a position snapshot, backed by an rstar R*-tree.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::NodeId;

/// A node's position at the time the index was built.
#[derive(Debug, Clone, PartialEq)]
struct IndexedNode {
    id: NodeId,
    at: [f32; 2],
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.at)
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.at[0] - point[0];
        let dy = self.at[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-node lookups over a snapshot of node positions.
///
/// The index does not follow the simulation; callers rebuild it from a fresh
/// snapshot whenever positions may have changed.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedNode>,
}

impl SpatialIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `(id, x, y)` triples.
    pub fn rebuild<'a>(&mut self, points: impl IntoIterator<Item = (&'a NodeId, f32, f32)>) {
        let nodes = points
            .into_iter()
            .map(|(id, x, y)| IndexedNode {
                id: id.clone(),
                at: [x, y],
            })
            .collect();
        self.tree = RTree::bulk_load(nodes);
    }

    /// The node closest to `(x, y)`, if it lies within `radius`.
    pub fn nearest_within(&self, x: f32, y: f32, radius: f32) -> Option<&NodeId> {
        let query = [x, y];
        self.tree
            .nearest_neighbor(&query)
            .filter(|node| node.distance_2(&query) <= radius * radius)
            .map(|node| &node.id)
    }

    /// Every node within `radius` of `(x, y)`, in no particular order.
    pub fn in_radius(&self, x: f32, y: f32, radius: f32) -> Vec<&NodeId> {
        self.tree
            .locate_within_distance([x, y], radius * radius)
            .map(|node| &node.id)
            .collect()
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// True when no node is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
