//! Edge key type.
//!
//! Edges are the parent -> child connections of the hierarchy. They carry no
//! data of their own; the key is the pair of node ids so a renderer can find
//! the connector for an edge without querying its own element tree.

use std::fmt;

use serde::Serialize;

use super::node::NodeId;

/// Identifies the connection from `parent` to `child`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeKey {
    pub parent: NodeId,
    pub child: NodeId,
}

impl EdgeKey {
    #[inline]
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Self { parent, child }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.parent, self.child)
    }
}
