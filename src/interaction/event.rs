//! Input events and the effects they produce.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::tree::NodeId;

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "node", rename_all = "camelCase")]
pub enum PointerTarget {
    /// Empty canvas (or anything that is not a node affordance).
    Canvas,
    /// The drag affordance of a node.
    DragHandle(NodeId),
    /// The collapse affordance of a node.
    CollapseToggle(NodeId),
}

/// Raw input delivered to the interaction state machine.
///
/// `position` is relative to the container; `client` is the raw client
/// coordinate the platform reports.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    PointerDown {
        position: Point,
        client: Point,
        target: PointerTarget,
    },
    PointerMove {
        position: Point,
        client: Point,
    },
    PointerUp,
    PointerLeave,
    Wheel {
        position: Point,
        delta_y: f64,
    },
    /// Double-click on a node or a click on its collapse button.
    Activate {
        node: NodeId,
    },
}

/// What changed as a result of one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Nothing to redraw.
    None,
    /// Only the transform changed.
    TransformChanged,
    /// A drag gesture picked up this node.
    DragStarted(NodeId),
    /// The dragged node moved; redraw it and its connections.
    NodeMoved(NodeId),
    /// The drag gesture on this node ended.
    DragEnded { node: NodeId, moved: bool },
    /// The node's collapsed flag flipped; a full refresh is due.
    CollapseToggled(NodeId),
}
