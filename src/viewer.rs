//! Tree viewer.
//!
//! Ties the model, layout, viewport, spatial index and interaction machine
//! together for one container. Every mutation that changes structure or
//! collapse state goes through [`TreeViewer::refresh`], which runs layout,
//! bounds and hit-test indexing back to back. Node drags skip that pipeline
//! and only report the moved node and its connections until the drag ends.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::geometry::{ContainerSize, Point};
use crate::interaction::{
    Effect, InteractionEvent, InteractionMachine, InteractionState, PointerTarget,
};
use crate::layout::{SCurve, TreeBounds, TreeLayout};
use crate::spatial::SpatialIndex;
use crate::tree::{NodeId, NodeIndex, TreeModel};
use crate::viewport::{ViewportController, ViewportTransform};

// ============================================================================
// Render Output
// ============================================================================

/// One visible node, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub collapsed: bool,
    pub dragging: bool,
    pub manually_positioned: bool,
    pub has_children: bool,
    /// The input record, for templating.
    pub data: Map<String, Value>,
}

/// One parent -> child connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    pub parent: NodeId,
    pub child: NodeId,
    pub curve: SCurve,
    /// SVG path data for `curve`.
    pub path: String,
}

/// Everything a renderer needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub transform: ViewportTransform,
    pub bounds: TreeBounds,
    /// Visible nodes in paint order; a node raised by a drag comes last.
    pub nodes: Vec<NodeView>,
    pub connections: Vec<ConnectionView>,
}

/// What a renderer has to redraw after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewUpdate {
    None,
    /// Only the group transform changed.
    Transform(ViewportTransform),
    /// One node moved; redraw it and the listed connectors.
    #[serde(rename_all = "camelCase")]
    NodeMoved {
        node: NodeView,
        connections: Vec<ConnectionView>,
    },
    /// Redraw everything.
    Frame(Frame),
}

// ============================================================================
// Viewer
// ============================================================================

/// An interactive tree view bound to one container.
#[derive(Debug)]
pub struct TreeViewer {
    config: ViewerConfig,
    model: TreeModel,
    layout: TreeLayout,
    viewport: ViewportController,
    interaction: InteractionMachine,
    spatial: SpatialIndex,
    container: ContainerSize,

    /// Visible nodes from the last layout pass, pre-order.
    visible: Vec<NodeIndex>,
    bounds: TreeBounds,

    /// Node painted on top until the next refresh.
    raised: Option<NodeId>,
}

impl TreeViewer {
    /// Build a viewer, lay the tree out and center it in `container`.
    pub fn new(
        config: ViewerConfig,
        records: &[Map<String, Value>],
        container: ContainerSize,
    ) -> Result<Self> {
        config.validate()?;
        let model = TreeModel::build(records, &config.record_fields())?;

        let mut viewer = Self {
            layout: TreeLayout::new(config.layout),
            viewport: ViewportController::with_reset_pan(config.reset_pan),
            interaction: InteractionMachine::new(config.interaction_options()),
            spatial: SpatialIndex::new(),
            container,
            model,
            config,
            visible: Vec::new(),
            bounds: TreeBounds::default(),
            raised: None,
        };
        viewer.refresh();
        viewer.center_tree();
        Ok(viewer)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn model(&self) -> &TreeModel {
        &self.model
    }

    pub fn transform(&self) -> ViewportTransform {
        self.viewport.transform()
    }

    /// Bounds of the visible nodes after the last refresh.
    pub fn bounds(&self) -> TreeBounds {
        self.bounds
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Lay out, store positions, recompute bounds and rebuild the hit-test
    /// index.
    pub fn refresh(&mut self) {
        let result = self.layout.compute(&self.model);
        result.apply(&mut self.model);

        self.visible = result.indices().collect();
        self.raised = None;

        let config = self.layout.config();
        self.bounds = TreeBounds::from_positions(
            result.placements.iter().map(|p| p.position),
            config.node_width,
            config.node_height,
        )
        .unwrap_or_default();

        let boxes: Vec<(NodeId, Point)> = result
            .placements
            .iter()
            .filter_map(|p| self.model.node(p.index).map(|n| (n.id.clone(), p.position)))
            .collect();
        self.spatial
            .rebuild(boxes, config.node_width, config.node_height);

        tracing::debug!(
            visible = self.visible.len(),
            total = self.model.len(),
            "tree refreshed"
        );
    }

    /// Replace the data set. Collapse and manual positions start over.
    pub fn update_data(&mut self, records: &[Map<String, Value>]) -> Result<()> {
        self.model = TreeModel::build(records, &self.config.record_fields())?;
        self.interaction.reset();
        self.refresh();
        self.center_tree();
        Ok(())
    }

    /// Collapse or expand a node by id. Returns false for unknown ids.
    pub fn toggle_node_collapse(&mut self, id: &NodeId) -> bool {
        if !self.model.toggle_collapse(id) {
            return false;
        }
        self.refresh();
        self.center_tree();
        true
    }

    /// Hand every dragged node back to the layout engine.
    pub fn reset_node_positions(&mut self) {
        self.model.reset_positions();
        self.refresh();
        self.center_tree();
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    pub fn center_tree(&mut self) {
        self.viewport
            .fit(&self.bounds, self.container, self.config.center_padding);
    }

    pub fn zoom_to_fit(&mut self) {
        self.viewport
            .fit(&self.bounds, self.container, self.config.fit_padding);
    }

    /// Assign the transform directly, e.g. to restore a saved view.
    pub fn set_transform(&mut self, scale: f64, pan_x: f64, pan_y: f64) {
        self.viewport.set_transform(scale, pan_x, pan_y);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(1.0 / self.config.zoom_step);
    }

    /// Record a new container size. The transform is left alone.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.container = ContainerSize::new(width, height);
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Resolve a container-space point to what a pointer-down there hits.
    pub fn hit_test(&self, position: Point) -> PointerTarget {
        if !self.config.draggable {
            return PointerTarget::Canvas;
        }
        let content = self.viewport.transform().to_content(position);
        match self.spatial.node_at(content) {
            Some(id) => PointerTarget::DragHandle(id),
            None => PointerTarget::Canvas,
        }
    }

    pub fn handle_event(&mut self, event: InteractionEvent) -> ViewUpdate {
        let effect = self
            .interaction
            .handle(event, &mut self.model, &mut self.viewport);

        match effect {
            Effect::None => ViewUpdate::None,
            Effect::TransformChanged => ViewUpdate::Transform(self.viewport.transform()),
            Effect::DragStarted(id) => {
                if let Some(position) = self.model.get(&id).and_then(|n| n.position) {
                    self.spatial.raise_and_move(&id, position);
                }
                self.raised = Some(id);
                ViewUpdate::Frame(self.frame())
            }
            Effect::NodeMoved(id) => {
                let Some(node) = self.model.index_of(&id).and_then(|i| self.node_view(i)) else {
                    return ViewUpdate::None;
                };
                self.spatial
                    .raise_and_move(&id, Point::new(node.x, node.y));
                ViewUpdate::NodeMoved {
                    connections: self.connections_for(&id),
                    node,
                }
            }
            Effect::DragEnded { node, moved } => {
                if moved {
                    tracing::debug!(%node, "drag ended, re-laying out");
                    self.refresh();
                    if self.config.recenter_after_drag {
                        self.center_tree();
                    }
                }
                ViewUpdate::Frame(self.frame())
            }
            Effect::CollapseToggled(_) => {
                self.refresh();
                self.center_tree();
                ViewUpdate::Frame(self.frame())
            }
        }
    }

    // =========================================================================
    // Render Output
    // =========================================================================

    /// Snapshot of the current state.
    pub fn frame(&self) -> Frame {
        let mut order = self.visible.clone();
        if let Some(raised) = self.raised.as_ref().and_then(|id| self.model.index_of(id)) {
            if let Some(at) = order.iter().position(|&i| i == raised) {
                let index = order.remove(at);
                order.push(index);
            }
        }

        let nodes = order.iter().filter_map(|&i| self.node_view(i)).collect();

        let connections = self
            .visible
            .iter()
            .filter(|&&i| self.model.node(i).is_some_and(|n| !n.is_collapsed()))
            .flat_map(|&parent| {
                self.model
                    .children(parent)
                    .into_iter()
                    .filter_map(move |child| self.connection(parent, child))
            })
            .collect();

        Frame {
            transform: self.viewport.transform(),
            bounds: self.bounds,
            nodes,
            connections,
        }
    }

    /// Connectors that move with `id`: from its parent, and to its children
    /// unless it is collapsed.
    pub fn connections_for(&self, id: &NodeId) -> Vec<ConnectionView> {
        let Some(index) = self.model.index_of(id) else {
            return Vec::new();
        };
        self.model
            .edges_touching(index)
            .iter()
            .filter_map(|key| {
                let (parent, child) = self.model.edge_endpoints(key)?;
                self.connection(parent, child)
            })
            .collect()
    }

    fn connection(&self, parent: NodeIndex, child: NodeIndex) -> Option<ConnectionView> {
        let p = self.model.node(parent)?;
        let c = self.model.node(child)?;
        let curve = SCurve::between(
            p.position?,
            c.position?,
            self.layout.config(),
            self.config.curve_factor,
        );
        Some(ConnectionView {
            parent: p.id.clone(),
            child: c.id.clone(),
            path: curve.svg_path(),
            curve,
        })
    }

    fn node_view(&self, index: NodeIndex) -> Option<NodeView> {
        let node = self.model.node(index)?;
        let position = node.position?;
        Some(NodeView {
            id: node.id.clone(),
            x: position.x,
            y: position.y,
            collapsed: node.is_collapsed(),
            dragging: node.state.is_dragging(),
            manually_positioned: node.is_manually_positioned(),
            has_children: self.model.has_children(index),
            data: node.payload.clone(),
        })
    }
}
