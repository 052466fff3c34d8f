//! TreeModel - the node hierarchy built from flat records.
//!
//! Nodes live in a petgraph StableGraph arena and are addressed by
//! `NodeIndex`. Parent -> child relations are directed edges; sibling order is
//! edge insertion order, which is record order. Two maps sit alongside the
//! graph: user id -> index and `(parent, child)` -> edge.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde_json::{Map, Value};

use super::edge::EdgeKey;
use super::node::{NodeId, TreeNode};
use crate::error::{Result, TreeError};

/// Record field names that carry identity and parentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub id: String,
    pub parent_id: String,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            parent_id: "parent_id".to_string(),
        }
    }
}

/// The tree model.
///
/// This struct manages:
/// - The node arena and parent -> child adjacency
/// - Root order (records without a resolvable parent, in input order)
/// - Id and edge lookup maps
#[derive(Debug, Clone, Default)]
pub struct TreeModel {
    graph: StableGraph<TreeNode, (), Directed>,

    /// Map from user id to arena index
    ids: HashMap<NodeId, NodeIndex>,

    /// Map from (parent, child) to the connecting edge
    edges: HashMap<EdgeKey, EdgeIndex>,

    /// Root nodes in input order
    roots: Vec<NodeIndex>,
}

impl TreeModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from flat records.
    ///
    /// Records without an id are skipped. When several records share an id
    /// the last one wins outright: earlier records with that id are dropped
    /// from the hierarchy instead of staying behind as unreachable duplicate
    /// nodes, and the survivor takes the last record's place in sibling
    /// order. A record whose parent is not present becomes an extra root.
    /// Parent chains that loop back on themselves are rejected.
    pub fn build(records: &[Map<String, Value>], fields: &RecordFields) -> Result<Self> {
        let mut entries: Vec<Option<TreeNode>> = Vec::with_capacity(records.len());
        let mut latest: HashMap<NodeId, usize> = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let Some(id) = record.get(&fields.id).and_then(NodeId::from_json) else {
                tracing::warn!(record = position, field = %fields.id, "record has no usable id, skipping");
                continue;
            };
            let parent_id = record.get(&fields.parent_id).and_then(NodeId::from_json);

            if let Some(previous) = latest.insert(id.clone(), entries.len()) {
                tracing::warn!(%id, "duplicate node id, later record replaces earlier one");
                entries[previous] = None;
            }
            entries.push(Some(TreeNode::new(id, parent_id, record.clone())));
        }

        let mut model = Self::new();
        let mut order = Vec::with_capacity(latest.len());
        for node in entries.into_iter().flatten() {
            let id = node.id.clone();
            let index = model.graph.add_node(node);
            model.ids.insert(id, index);
            order.push(index);
        }

        for &index in &order {
            let node = &model.graph[index];
            let parent = node
                .parent_id
                .as_ref()
                .and_then(|p| model.ids.get(p).copied());

            match parent {
                Some(parent_index) => {
                    let key = EdgeKey::new(
                        model.graph[parent_index].id.clone(),
                        model.graph[index].id.clone(),
                    );
                    let edge = model.graph.add_edge(parent_index, index, ());
                    model.edges.insert(key, edge);
                }
                None => {
                    if let Some(parent_id) = &node.parent_id {
                        tracing::debug!(id = %node.id, parent = %parent_id, "parent not found, promoting to root");
                    }
                    model.roots.push(index);
                }
            }
        }

        if let Err(cycle) = toposort(&model.graph, None) {
            let id = model.graph[cycle.node_id()].id.clone();
            return Err(TreeError::CyclicParent { id });
        }

        tracing::debug!(
            nodes = model.graph.node_count(),
            roots = model.roots.len(),
            "tree model built"
        );
        Ok(model)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Number of nodes in the model.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Root nodes in input order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.graph.node_weight(index)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut TreeNode> {
        self.graph.node_weight_mut(index)
    }

    /// Get a node by its user id.
    pub fn get(&self, id: &NodeId) -> Option<&TreeNode> {
        self.index_of(id).and_then(|index| self.node(index))
    }

    /// Get a node mutably by its user id.
    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut TreeNode> {
        let index = self.index_of(id)?;
        self.node_mut(index)
    }

    /// Children of a node, in input order.
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        children.sort_by_key(|&(edge, _)| edge);
        children.into_iter().map(|(_, child)| child).collect()
    }

    /// Structural parent of a node (`None` for roots).
    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    pub fn has_children(&self, index: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .next()
            .is_some()
    }

    /// Arena indices of the parent and child an edge key connects, through
    /// the edge map. `None` when no such edge exists.
    pub fn edge_endpoints(&self, key: &EdgeKey) -> Option<(NodeIndex, NodeIndex)> {
        let edge = self.edges.get(key)?;
        self.graph.edge_endpoints(*edge)
    }

    /// Every node reachable from the roots, pre-order, ignoring collapse.
    pub fn all_nodes(&self) -> Vec<NodeIndex> {
        let mut result = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeIndex> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            result.push(index);
            stack.extend(self.children(index).into_iter().rev());
        }
        result
    }

    /// Edges whose connector moves when `index` moves: the edge from its
    /// parent, and the edges to its children unless it is collapsed.
    pub fn edges_touching(&self, index: NodeIndex) -> Vec<EdgeKey> {
        let Some(node) = self.node(index) else {
            return Vec::new();
        };

        let mut keys = Vec::new();
        if let Some(parent) = self.parent(index).and_then(|p| self.node(p)) {
            if !parent.is_collapsed() {
                keys.push(EdgeKey::new(parent.id.clone(), node.id.clone()));
            }
        }
        if !node.is_collapsed() {
            for child in self.children(index) {
                keys.push(EdgeKey::new(node.id.clone(), self.graph[child].id.clone()));
            }
        }
        keys
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Toggle the collapsed flag of a node.
    ///
    /// Returns false when the id is unknown.
    pub fn toggle_collapse(&mut self, id: &NodeId) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.toggle_collapse();
                true
            }
            None => false,
        }
    }

    /// Return every node to automatic layout.
    pub fn reset_positions(&mut self) {
        for index in self.all_nodes() {
            if let Some(node) = self.node_mut(index) {
                node.reset_position();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Value) -> Vec<Map<String, Value>> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn ids(model: &TreeModel, indices: &[NodeIndex]) -> Vec<NodeId> {
        indices
            .iter()
            .map(|&i| model.node(i).unwrap().id.clone())
            .collect()
    }

    #[test]
    fn test_build_simple_tree() {
        let data = records(json!([
            {"id": 1, "parent_id": null, "text": "root"},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": 1},
        ]));
        let model = TreeModel::build(&data, &RecordFields::default()).unwrap();

        assert_eq!(model.len(), 3);
        assert_eq!(ids(&model, model.roots()), vec![NodeId::from(1)]);

        let root = model.index_of(&NodeId::from(1)).unwrap();
        assert_eq!(
            ids(&model, &model.children(root)),
            vec![NodeId::from(2), NodeId::from(3)]
        );
        assert_eq!(model.get(&NodeId::from(1)).unwrap().payload["text"], json!("root"));
        assert_eq!(
            model.edge_endpoints(&EdgeKey::new(NodeId::from(1), NodeId::from(3))),
            Some((root, model.index_of(&NodeId::from(3)).unwrap()))
        );
        assert_eq!(
            model.edge_endpoints(&EdgeKey::new(NodeId::from(2), NodeId::from(3))),
            None
        );
    }

    #[test]
    fn test_children_keep_input_order() {
        let data = records(json!([
            {"id": "c", "parent_id": "r"},
            {"id": "r"},
            {"id": "a", "parent_id": "r"},
            {"id": "b", "parent_id": "r"},
        ]));
        let model = TreeModel::build(&data, &RecordFields::default()).unwrap();
        let root = model.index_of(&NodeId::from("r")).unwrap();

        assert_eq!(
            ids(&model, &model.children(root)),
            vec![NodeId::from("c"), NodeId::from("a"), NodeId::from("b")]
        );
    }

    #[test]
    fn test_missing_parent_promoted_to_root() {
        let data = records(json!([
            {"id": 1},
            {"id": 2, "parent_id": 99},
        ]));
        let model = TreeModel::build(&data, &RecordFields::default()).unwrap();

        assert_eq!(
            ids(&model, model.roots()),
            vec![NodeId::from(1), NodeId::from(2)]
        );
    }

    #[test]
    fn test_duplicate_id_last_write_wins() {
        let data = records(json!([
            {"id": 1, "label": "first"},
            {"id": 2, "parent_id": 1},
            {"id": 1, "label": "second"},
        ]));
        let model = TreeModel::build(&data, &RecordFields::default()).unwrap();

        assert_eq!(model.len(), 2);
        assert_eq!(model.get(&NodeId::from(1)).unwrap().payload["label"], json!("second"));
        let root = model.index_of(&NodeId::from(1)).unwrap();
        assert_eq!(ids(&model, &model.children(root)), vec![NodeId::from(2)]);
    }

    #[test]
    fn test_custom_field_names() {
        let data = records(json!([
            {"key": "root"},
            {"key": "leaf", "up": "root"},
        ]));
        let fields = RecordFields {
            id: "key".to_string(),
            parent_id: "up".to_string(),
        };
        let model = TreeModel::build(&data, &fields).unwrap();

        let leaf = model.index_of(&NodeId::from("leaf")).unwrap();
        assert_eq!(model.parent(leaf), model.index_of(&NodeId::from("root")));
    }

    #[test]
    fn test_record_without_id_skipped() {
        let data = records(json!([
            {"id": 1},
            {"name": "orphan"},
        ]));
        let model = TreeModel::build(&data, &RecordFields::default()).unwrap();
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_cycle_rejected() {
        let data = records(json!([
            {"id": 1, "parent_id": 2},
            {"id": 2, "parent_id": 1},
        ]));
        let err = TreeModel::build(&data, &RecordFields::default()).unwrap_err();
        assert!(matches!(err, TreeError::CyclicParent { .. }));
    }

    #[test]
    fn test_self_parent_rejected() {
        let data = records(json!([{"id": 1, "parent_id": 1}]));
        let err = TreeModel::build(&data, &RecordFields::default()).unwrap_err();
        assert_eq!(err, TreeError::CyclicParent { id: NodeId::from(1) });
    }

    #[test]
    fn test_all_nodes_pre_order() {
        let data = records(json!([
            {"id": 1},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": 2},
            {"id": 4, "parent_id": 1},
            {"id": 5},
        ]));
        let model = TreeModel::build(&data, &RecordFields::default()).unwrap();
        let all = model.all_nodes();

        assert_eq!(
            ids(&model, &all),
            [1, 2, 3, 4, 5].map(NodeId::from).to_vec()
        );
    }

    #[test]
    fn test_edges_touching_respects_collapse() {
        let data = records(json!([
            {"id": 1},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": 2},
        ]));
        let mut model = TreeModel::build(&data, &RecordFields::default()).unwrap();
        let middle = model.index_of(&NodeId::from(2)).unwrap();

        assert_eq!(
            model.edges_touching(middle),
            vec![
                EdgeKey::new(NodeId::from(1), NodeId::from(2)),
                EdgeKey::new(NodeId::from(2), NodeId::from(3)),
            ]
        );

        assert!(model.toggle_collapse(&NodeId::from(2)));
        assert_eq!(
            model.edges_touching(middle),
            vec![EdgeKey::new(NodeId::from(1), NodeId::from(2))]
        );
    }

    #[test]
    fn test_toggle_unknown_node() {
        let mut model = TreeModel::new();
        assert!(!model.toggle_collapse(&NodeId::from(1)));
    }
}
