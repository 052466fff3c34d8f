//! Tree data structures.
//!
//! This module builds the node hierarchy from flat records. Nodes live in an
//! arena (petgraph's StableGraph) and refer to each other by index, so parent
//! and child links never own one another.

mod edge;
mod model;
mod node;

pub use edge::EdgeKey;
pub use model::{RecordFields, TreeModel};
pub use node::{NodeId, NodeState, TreeNode};
pub use petgraph::stable_graph::NodeIndex;
