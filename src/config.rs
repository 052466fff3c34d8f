//! Viewer configuration.
//!
//! Deserialized from the options object handed to the JS constructor, so the
//! keys are camelCase and every field has a default. Keys that only matter to
//! a renderer (templates, colours, background pattern) are accepted and
//! ignored.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::geometry::Point;
use crate::interaction::InteractionOptions;
use crate::layout::{DEFAULT_CURVE_FACTOR, LayoutConfig};
use crate::tree::RecordFields;
use crate::viewport::{CENTER_PADDING, DEFAULT_RESET_PAN, FIT_PADDING, ZOOM_STEP};

/// Everything a [`TreeViewer`](crate::viewer::TreeViewer) is configured by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    /// DOM id of the element the tree is drawn into. Required.
    pub container_id: String,
    /// Record field holding the node id.
    pub id_alias: String,
    /// Record field holding the parent id.
    pub parent_id_alias: String,
    /// Let users collapse and expand nodes.
    pub collapse_child: bool,
    /// Let users drag nodes. Also read from `nodeDraggable`.
    #[serde(alias = "nodeDraggable")]
    pub draggable: bool,
    #[serde(flatten)]
    pub layout: LayoutConfig,
    /// Control point offset of connectors, as a fraction of the vertical span.
    pub curve_factor: f64,
    /// Zoom multiplier per wheel tick or button press.
    pub zoom_step: f64,
    /// Padding around the bounds for [`center_tree`](crate::viewer::TreeViewer::center_tree).
    pub center_padding: f64,
    /// Padding around the bounds for [`zoom_to_fit`](crate::viewer::TreeViewer::zoom_to_fit).
    pub fit_padding: f64,
    /// Pan restored by [`reset_view`](crate::viewer::TreeViewer::reset_view).
    pub reset_pan: Point,
    /// Center the tree again after a drag moved a node.
    pub recenter_after_drag: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let fields = RecordFields::default();
        Self {
            container_id: String::new(),
            id_alias: fields.id,
            parent_id_alias: fields.parent_id,
            collapse_child: false,
            draggable: true,
            layout: LayoutConfig::default(),
            curve_factor: DEFAULT_CURVE_FACTOR,
            zoom_step: ZOOM_STEP,
            center_padding: CENTER_PADDING,
            fit_padding: FIT_PADDING,
            reset_pan: DEFAULT_RESET_PAN,
            recenter_after_drag: false,
        }
    }
}

impl ViewerConfig {
    /// Default configuration drawing into `container_id`.
    pub fn for_container(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            ..Self::default()
        }
    }

    /// Reject configurations a viewer cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.container_id.trim().is_empty() {
            return Err(TreeError::MissingContainer);
        }
        Ok(())
    }

    pub fn record_fields(&self) -> RecordFields {
        RecordFields {
            id: self.id_alias.clone(),
            parent_id: self.parent_id_alias.clone(),
        }
    }

    pub fn interaction_options(&self) -> InteractionOptions {
        InteractionOptions {
            collapse_child: self.collapse_child,
            draggable: self.draggable,
            zoom_step: self.zoom_step,
        }
    }
}
