//! Top-down tree layout.
//!
//! Places every visible node of a [`TreeModel`] on a grid of levels. Each
//! subtree reserves a horizontal span equal to the sum of its children's
//! spans (a leaf reserves `horizontal_spacing`), and every parent is centered
//! over the full span of its children, from the leftmost child's left edge to
//! the rightmost child's right edge.
//!
//! # Algorithm Overview
//!
//! 1. **Placement walk (depth-first, explicit stack):** each subtree is laid
//!    out from a horizontal cursor, writes its placements to one contiguous
//!    pre-order range of the output and reports the width it reserved.
//!    Siblings are laid out left to right, each starting where the previous
//!    sibling's reservation ended.
//! 2. **Roots:** root subtrees follow each other with `node_padding` between
//!    them.
//! 3. **Normalize:** if anything ended up left of zero (only possible through
//!    manually positioned nodes), every placement shifts right so that the
//!    minimum x is zero.
//!
//! The walk never writes to the model. [`LayoutResult::apply`] stores the
//! computed positions afterwards.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::tree::{NodeIndex, TreeModel};

/// Configuration for the tree layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Vertical distance between tree levels.
    pub level_height: f64,
    /// Horizontal span reserved by a leaf.
    pub horizontal_spacing: f64,
    /// Extra gap between the spans of consecutive roots.
    pub node_padding: f64,
    /// Width of a node box.
    pub node_width: f64,
    /// Height of a node box.
    pub node_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_height: 150.0,
            horizontal_spacing: 200.0,
            node_padding: 40.0,
            node_width: 160.0,
            node_height: 100.0,
        }
    }
}

/// Where one node goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// The node in the model arena.
    pub index: NodeIndex,
    /// Position the node will have after this pass.
    pub position: Point,
    /// Computed position to remember for a later reset. For manually
    /// positioned nodes this is the previously stored value.
    pub origin: Option<Point>,
}

/// Result of a layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    /// Visible nodes in pre-order: a parent precedes its children, roots go
    /// left to right.
    pub placements: Vec<Placement>,
}

impl LayoutResult {
    /// Number of nodes laid out.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Arena indices in layout order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.placements.iter().map(|p| p.index)
    }

    /// Write positions and origins back into the model.
    pub fn apply(&self, model: &mut TreeModel) {
        for placement in &self.placements {
            if let Some(node) = model.node_mut(placement.index) {
                node.position = Some(placement.position);
                if placement.origin.is_some() {
                    node.origin = placement.origin;
                }
            }
        }
    }
}

/// A laid-out subtree: the range of its placements in the output (subtree
/// root first) and the width it reserves.
struct Subtree {
    range: Range<usize>,
    width: f64,
}

/// A node whose children are still being laid out.
struct Pending {
    /// Output slot of the node itself.
    slot: usize,
    depth: u32,
    /// Manually positioned nodes keep their slot as written on entry.
    manual: bool,
    children: Vec<NodeIndex>,
    next: usize,
    /// Where this subtree's span starts.
    cursor: f64,
    /// Width reserved by the children placed so far.
    total: f64,
    first_child: Option<usize>,
    last_child: Option<usize>,
}

impl Pending {
    /// The next child to lay out, with its depth and starting cursor.
    fn next_child(&mut self) -> Option<(NodeIndex, u32, f64)> {
        let child = *self.children.get(self.next)?;
        self.next += 1;
        Some((child, self.depth + 1, self.cursor + self.total))
    }

    fn absorb(&mut self, child: &Subtree) {
        self.total += child.width;
        if !child.range.is_empty() {
            self.first_child.get_or_insert(child.range.start);
            self.last_child = Some(child.range.start);
        }
    }
}

enum Step {
    Done(Subtree),
    Descend(Pending),
}

/// The tree layout engine.
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    config: LayoutConfig,
}

impl TreeLayout {
    /// Create a new tree layout with the given configuration.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Create a tree layout with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(LayoutConfig::default())
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute positions for every visible node of `model`.
    pub fn compute(&self, model: &TreeModel) -> LayoutResult {
        let mut placements = Vec::with_capacity(model.len());
        let mut cursor = 0.0;

        for &root in model.roots() {
            let subtree = self.place(model, root, cursor, &mut placements);
            cursor += subtree.width + self.config.node_padding;
        }

        let min_x = placements
            .iter()
            .map(|p| p.position.x)
            .fold(f64::INFINITY, f64::min);
        if min_x < 0.0 {
            for placement in &mut placements {
                placement.position.x -= min_x;
                if let Some(origin) = placement.origin.as_mut() {
                    origin.x -= min_x;
                }
            }
        }

        tracing::debug!(nodes = placements.len(), "tree layout computed");
        LayoutResult { placements }
    }

    /// Lay out the subtree under `root` starting at `cursor`, appending its
    /// placements to `out`.
    ///
    /// The walk keeps its own stack of pending nodes, so depth is bounded by
    /// memory rather than the call stack.
    fn place(
        &self,
        model: &TreeModel,
        root: NodeIndex,
        cursor: f64,
        out: &mut Vec<Placement>,
    ) -> Subtree {
        let mut stack: Vec<Pending> = Vec::new();
        let mut step = self.enter(model, root, 0, cursor, out);

        loop {
            match step {
                Step::Descend(pending) => stack.push(pending),
                Step::Done(subtree) => match stack.last_mut() {
                    Some(parent) => parent.absorb(&subtree),
                    None => return subtree,
                },
            }

            step = match stack.last_mut().and_then(Pending::next_child) {
                Some((child, depth, cursor)) => self.enter(model, child, depth, cursor, out),
                None => match stack.pop() {
                    Some(pending) => Step::Done(self.finish(pending, out)),
                    None => {
                        return Subtree {
                            range: out.len()..out.len(),
                            width: 0.0,
                        };
                    }
                },
            };
        }
    }

    /// Reserve the output slot for `index` and either finish it right away
    /// (leaves, collapsed nodes) or hand back its pending children.
    fn enter(
        &self,
        model: &TreeModel,
        index: NodeIndex,
        depth: u32,
        cursor: f64,
        out: &mut Vec<Placement>,
    ) -> Step {
        let slot = out.len();
        let Some(node) = model.node(index) else {
            return Step::Done(Subtree {
                range: slot..slot,
                width: 0.0,
            });
        };

        let manual = node
            .position
            .filter(|_| node.is_manually_positioned());
        out.push(match manual {
            Some(position) => Placement {
                index,
                position,
                origin: node.origin,
            },
            None => {
                let position = Point::new(cursor, f64::from(depth) * self.config.level_height);
                Placement {
                    index,
                    position,
                    origin: Some(position),
                }
            }
        });

        let children = if node.is_collapsed() {
            Vec::new()
        } else {
            model.children(index)
        };
        if children.is_empty() {
            return Step::Done(Subtree {
                range: slot..out.len(),
                width: self.config.horizontal_spacing,
            });
        }

        Step::Descend(Pending {
            slot,
            depth,
            manual: manual.is_some(),
            children,
            next: 0,
            cursor,
            total: 0.0,
            first_child: None,
            last_child: None,
        })
    }

    /// All children are placed: center the node over them and report the
    /// subtree's width.
    fn finish(&self, pending: Pending, out: &mut [Placement]) -> Subtree {
        let spacing = self.config.horizontal_spacing;
        let range = pending.slot..out.len();

        if pending.manual {
            return Subtree {
                range,
                width: spacing.max(pending.total),
            };
        }

        let child_x = |slot: Option<usize>| slot.and_then(|s| out.get(s)).map_or(0.0, |p| p.position.x);
        let left = child_x(pending.first_child);
        let right = child_x(pending.last_child) + self.config.node_width;
        let x = left + (right - left) / 2.0 - self.config.node_width / 2.0;

        let y = f64::from(pending.depth) * self.config.level_height;
        let position = Point::new(x, y);
        if let Some(placement) = out.get_mut(pending.slot) {
            placement.position = position;
            placement.origin = Some(position);
        }

        Subtree {
            range,
            width: if pending.total == 0.0 {
                spacing
            } else {
                pending.total
            },
        }
    }
}
