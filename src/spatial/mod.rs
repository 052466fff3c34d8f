//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based index over node boxes so pointer
//! events can be resolved to the node under the cursor.

mod rtree;

pub use rtree::{NodeBox, SpatialIndex};
