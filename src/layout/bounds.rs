//! Axis-aligned bounds of the laid-out tree.

use serde::Serialize;

use crate::geometry::Point;

/// Bounding box of every positioned node box, in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl TreeBounds {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounds of node boxes of `node_width x node_height` placed at each
    /// top-left corner in `positions`.
    ///
    /// Returns `None` when there is nothing to bound.
    pub fn from_positions<I>(positions: I, node_width: f64, node_height: f64) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in positions {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x + node_width);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y + node_height);
        }

        if min_x == f64::INFINITY {
            return None;
        }

        Some(Self::new(min_x, min_y, max_x, max_y))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }
}
