//! S-curve connectors between a parent and a child.
//!
//! A connector runs from the parent's bottom-center to the child's top-center
//! as a cubic Bezier. Both control points sit straight above/below their
//! endpoint, offset by `factor` of the vertical span, which gives the curve
//! its S shape.

use std::fmt::Write;

use serde::Serialize;

use super::tree_layout::LayoutConfig;
use crate::geometry::Point;

/// Default fraction of the vertical span used for control point offsets.
pub const DEFAULT_CURVE_FACTOR: f64 = 0.5;

/// Cubic Bezier from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SCurve {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl SCurve {
    /// Curve between two endpoints.
    pub fn new(start: Point, end: Point, factor: f64) -> Self {
        let dy = end.y - start.y;
        Self {
            start,
            control1: Point::new(start.x, start.y + dy * factor),
            control2: Point::new(end.x, end.y - dy * factor),
            end,
        }
    }

    /// Connector from a parent box at `parent` to a child box at `child`
    /// (both top-left corners).
    pub fn between(parent: Point, child: Point, config: &LayoutConfig, factor: f64) -> Self {
        let half = config.node_width / 2.0;
        Self::new(
            Point::new(parent.x + half, parent.y + config.node_height),
            Point::new(child.x + half, child.y),
            factor,
        )
    }

    /// SVG path data: `M x1 y1 C c1x c1y, c2x c2y, x2 y2`.
    pub fn svg_path(&self) -> String {
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        );
        d
    }
}
