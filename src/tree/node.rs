//! Node type and related structures.
//!
//! Nodes are the elements of the hierarchy. Each node has:
//! - A user-facing identity read from the input record (integer or string)
//! - The opaque record it was built from
//! - Position (x, y) once laid out, plus the last computed position
//! - Collapse / manual-position / dragging flags

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::Point;

/// User-facing node identifier.
///
/// Integer and string ids never compare equal, so `1` and `"1"` are
/// different nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Str(String),
}

impl NodeId {
    /// Read an id out of a JSON value.
    ///
    /// Returns `None` for `null` and for values that cannot act as an id
    /// (booleans, arrays, objects).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                            Some(Self::Int(f as i64))
                        }
                        _ => Some(Self::Str(n.to_string())),
                    }
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeId {
    #[inline]
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for NodeId {
    #[inline]
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for NodeId {
    #[inline]
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for NodeId {
    #[inline]
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const COLLAPSED: u8 = 0b0000_0001;
    const MANUAL: u8 = 0b0000_0010;
    const DRAGGING: u8 = 0b0000_0100;

    /// Create a new default node state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the node's descendants are hidden from layout.
    #[inline]
    pub fn is_collapsed(self) -> bool {
        self.flags & Self::COLLAPSED != 0
    }

    /// Set the collapsed state.
    #[inline]
    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.set(Self::COLLAPSED, collapsed);
    }

    /// Check if the node was placed by a user drag.
    #[inline]
    pub fn is_manually_positioned(self) -> bool {
        self.flags & Self::MANUAL != 0
    }

    /// Set the manually-positioned state.
    #[inline]
    pub fn set_manually_positioned(&mut self, manual: bool) {
        self.set(Self::MANUAL, manual);
    }

    /// Check if a drag gesture currently holds the node.
    #[inline]
    pub fn is_dragging(self) -> bool {
        self.flags & Self::DRAGGING != 0
    }

    /// Set the dragging state.
    #[inline]
    pub fn set_dragging(&mut self, dragging: bool) {
        self.set(Self::DRAGGING, dragging);
    }

    #[inline]
    fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// A single node of the hierarchy, stored in the tree model's arena.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Identity, unique within a tree.
    pub id: NodeId,
    /// Declared parent id as read from the record.
    pub parent_id: Option<NodeId>,
    /// The input record.
    pub payload: Map<String, Value>,
    /// Collapse / manual / dragging flags.
    pub state: NodeState,
    /// Current position; `None` until the first layout pass reaches the node.
    pub position: Option<Point>,
    /// Last position computed by the layout engine.
    pub origin: Option<Point>,
}

impl TreeNode {
    pub fn new(id: NodeId, parent_id: Option<NodeId>, payload: Map<String, Value>) -> Self {
        Self {
            id,
            parent_id,
            payload,
            state: NodeState::new(),
            position: None,
            origin: None,
        }
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.state.is_collapsed()
    }

    #[inline]
    pub fn is_manually_positioned(&self) -> bool {
        self.state.is_manually_positioned()
    }

    /// Flip the collapsed flag.
    pub fn toggle_collapse(&mut self) {
        let collapsed = self.state.is_collapsed();
        self.state.set_collapsed(!collapsed);
    }

    /// Hand the node back to the layout engine.
    ///
    /// Restores the last computed position when there is one.
    pub fn reset_position(&mut self) {
        if let Some(origin) = self.origin {
            self.position = Some(origin);
        }
        self.state.set_manually_positioned(false);
    }

    /// Move the node by a content-space delta and mark it manually positioned.
    ///
    /// Returns false when the node has never been laid out.
    pub fn translate(&mut self, dx: f64, dy: f64) -> bool {
        match self.position {
            Some(p) => {
                self.position = Some(p.offset(dx, dy));
                self.state.set_manually_positioned(true);
                true
            }
            None => false,
        }
    }
}
