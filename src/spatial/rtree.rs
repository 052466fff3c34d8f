//! R-tree based spatial index using the rstar crate.
//!
//! Holds one axis-aligned box per positioned node and answers "which node is
//! under this content-space point". Boxes overlap when nodes are dragged on
//! top of each other; the box with the highest stacking order wins.

use std::collections::HashMap;

use rstar::{AABB, Envelope, PointDistance, RTree, RTreeObject};

use crate::geometry::Point;
use crate::tree::NodeId;

/// A node's box in the spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    /// The node identifier.
    pub id: NodeId,
    /// Top-left corner.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    /// Stacking order; larger is drawn later (on top).
    pub order: u64,
}

impl NodeBox {
    pub fn new(id: NodeId, origin: Point, width: f64, height: f64, order: u64) -> Self {
        Self {
            id,
            origin,
            width,
            height,
            order,
        }
    }
}

impl RTreeObject for NodeBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.origin.x, self.origin.y],
            [self.origin.x + self.width, self.origin.y + self.height],
        )
    }
}

impl PointDistance for NodeBox {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.envelope().contains_point(point)
    }
}

/// Spatial index for positioned nodes.
///
/// Uses an R*-tree for efficient hit testing, plus an id map so a dragged
/// node's box can be found without scanning the tree.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<NodeBox>,
    boxes: HashMap<NodeId, NodeBox>,
    next_order: u64,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            boxes: HashMap::new(),
            next_order: 0,
        }
    }

    /// Rebuild the index from node boxes given in stacking order
    /// (first is bottom-most).
    ///
    /// This is more efficient than incremental inserts for bulk updates.
    pub fn rebuild<I>(&mut self, boxes: I, width: f64, height: f64)
    where
        I: IntoIterator<Item = (NodeId, Point)>,
    {
        let mut order = 0;
        let boxes: Vec<_> = boxes
            .into_iter()
            .map(|(id, origin)| {
                order += 1;
                NodeBox::new(id, origin, width, height, order)
            })
            .collect();

        self.next_order = order + 1;
        self.boxes = boxes.iter().map(|b| (b.id.clone(), b.clone())).collect();
        self.tree = RTree::bulk_load(boxes);
    }

    /// Move a node's box and put it on top of the stack.
    ///
    /// Returns false when the node was not indexed.
    pub fn raise_and_move(&mut self, id: &NodeId, origin: Point) -> bool {
        let Some(entry) = self.boxes.get_mut(id) else {
            return false;
        };
        self.tree.remove(entry);

        entry.origin = origin;
        entry.order = self.next_order;
        self.next_order += 1;
        self.tree.insert(entry.clone());
        true
    }

    /// The top-most node whose box contains `point`.
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        self.tree
            .locate_all_at_point(&[point.x, point.y])
            .max_by_key(|b| b.order)
            .map(|b| b.id.clone())
    }

    /// Get the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex {
        let mut index = SpatialIndex::new();
        index.rebuild(
            [
                (NodeId::from(1), Point::new(100.0, 0.0)),
                (NodeId::from(2), Point::new(0.0, 150.0)),
                (NodeId::from(3), Point::new(200.0, 150.0)),
            ],
            160.0,
            100.0,
        );
        index
    }

    #[test]
    fn test_node_at() {
        let index = index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.node_at(Point::new(150.0, 50.0)), Some(NodeId::from(1)));
        assert_eq!(index.node_at(Point::new(10.0, 200.0)), Some(NodeId::from(2)));
        assert_eq!(index.node_at(Point::new(180.0, 125.0)), None);
    }

    #[test]
    fn test_overlap_picks_top_most() {
        let mut index = index();
        // drag 2 so it overlaps 3
        assert!(index.raise_and_move(&NodeId::from(2), Point::new(180.0, 150.0)));
        assert_eq!(index.node_at(Point::new(250.0, 200.0)), Some(NodeId::from(2)));

        assert!(index.raise_and_move(&NodeId::from(3), Point::new(200.0, 150.0)));
        assert_eq!(index.node_at(Point::new(250.0, 200.0)), Some(NodeId::from(3)));
    }

    #[test]
    fn test_raise_unknown_node() {
        let mut index = index();
        assert!(!index.raise_and_move(&NodeId::from(99), Point::new(0.0, 0.0)));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_raise_keeps_index_consistent() {
        let mut index = index();
        for step in 0..50_i32 {
            let x = f64::from(step) * 4.0;
            assert!(index.raise_and_move(&NodeId::from(2), Point::new(x, 150.0)));
        }
        assert_eq!(index.len(), 3);
        // old location no longer hits, new one does
        assert_eq!(index.node_at(Point::new(10.0, 200.0)), None);
        assert_eq!(index.node_at(Point::new(200.0, 200.0)), Some(NodeId::from(2)));

        index.rebuild([(NodeId::from(4), Point::new(0.0, 0.0))], 10.0, 10.0);
        assert!(!index.raise_and_move(&NodeId::from(2), Point::new(0.0, 0.0)));
        assert_eq!(index.len(), 1);
    }
}
