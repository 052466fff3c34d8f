//! Layout for tree visualization.
//!
//! This module turns the tree model into content-space coordinates: node
//! positions, the bounding box of everything visible, and the connector
//! curves a renderer draws between parents and children.

pub mod bounds;
pub mod connector;
pub mod tree_layout;

pub use bounds::TreeBounds;
pub use connector::{DEFAULT_CURVE_FACTOR, SCurve};
pub use tree_layout::{LayoutConfig, LayoutResult, Placement, TreeLayout};
