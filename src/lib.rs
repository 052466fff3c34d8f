//! Tree Viewer - WASM Module
//!
//! This module provides the layout and interaction core of an interactive
//! node-link tree viewer. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen; a thin JS renderer draws the
//! frames it produces.
//!
//! # Architecture
//!
//! - `tree`: Node hierarchy built from flat records, on petgraph's StableGraph
//! - `layout`: Top-down tree layout, bounds and S-curve connectors
//! - `spatial`: R-tree index for O(log n) hit testing
//! - `viewport`: Pan/zoom transform, centering and fit-to-view
//! - `interaction`: Pointer state machine (pan, node drag, collapse)
//! - `viewer`: Orchestration of the above for one container
//! - `logging`: Tracing layer that writes to the browser console

use js_sys::Float64Array;
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod logging;
pub mod spatial;
pub mod tree;
pub mod viewer;
pub mod viewport;

pub use config::ViewerConfig;
pub use error::{Result, TreeError};
pub use geometry::{ContainerSize, Point};
pub use viewer::{Frame, TreeViewer, ViewUpdate};

use interaction::{InteractionEvent, PointerTarget};
use tree::NodeId;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::install(tracing::Level::WARN);
}

/// Interactive tree viewer bound to a DOM container.
///
/// This struct wraps [`TreeViewer`] and provides the public API exposed to
/// JavaScript. Every event method returns the update the renderer has to
/// apply.
#[wasm_bindgen]
pub struct TreeViewerWasm {
    viewer: TreeViewer,
}

#[wasm_bindgen]
impl TreeViewerWasm {
    /// Create a viewer from an options object.
    ///
    /// `options.containerId` must name an element in the document; its size
    /// is the initial container size. `options.data` holds the flat records.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> std::result::Result<TreeViewerWasm, JsValue> {
        let config: ViewerConfig =
            serde_wasm_bindgen::from_value(options.clone()).map_err(|e| {
                to_js_error(TreeError::InvalidOptions {
                    message: e.to_string(),
                })
            })?;
        config.validate().map_err(to_js_error)?;

        let container = container_size(&config.container_id).map_err(to_js_error)?;
        let data = js_sys::Reflect::get(&options, &JsValue::from_str("data"))?;
        let records = records_from_js(data)?;

        let viewer = TreeViewer::new(config, &records, container).map_err(to_js_error)?;
        Ok(Self { viewer })
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the data set and re-center.
    #[wasm_bindgen(js_name = updateData)]
    pub fn update_data(&mut self, data: JsValue) -> std::result::Result<JsValue, JsValue> {
        let records = records_from_js(data)?;
        self.viewer.update_data(&records).map_err(to_js_error)?;
        to_js(&self.viewer.frame())
    }

    /// Collapse or expand a node. Returns false for unknown ids.
    #[wasm_bindgen(js_name = toggleNodeCollapse)]
    pub fn toggle_node_collapse(&mut self, id: JsValue) -> bool {
        match node_id_from_js(&id) {
            Some(id) => self.viewer.toggle_node_collapse(&id),
            None => false,
        }
    }

    /// Return dragged nodes to their computed positions.
    #[wasm_bindgen(js_name = resetNodePositions)]
    pub fn reset_node_positions(&mut self) {
        self.viewer.reset_node_positions();
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    #[wasm_bindgen(js_name = centerTree)]
    pub fn center_tree(&mut self) {
        self.viewer.center_tree();
    }

    #[wasm_bindgen(js_name = zoomToFit)]
    pub fn zoom_to_fit(&mut self) {
        self.viewer.zoom_to_fit();
    }

    /// Assign the transform directly.
    #[wasm_bindgen(js_name = setTransform)]
    pub fn set_transform(&mut self, scale: f64, pan_x: f64, pan_y: f64) {
        self.viewer.set_transform(scale, pan_x, pan_y);
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&mut self) {
        self.viewer.reset_view();
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.viewer.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.viewer.zoom_out();
    }

    /// Tell the viewer its container changed size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewer.resize(width, height);
    }

    /// Current transform as `[scale, panX, panY]`.
    #[wasm_bindgen(js_name = getTransform)]
    pub fn get_transform(&self) -> Float64Array {
        let t = self.viewer.transform();
        Float64Array::from(&[t.scale, t.pan_x, t.pan_y][..])
    }

    /// Bounds of the visible tree in content coordinates.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.viewer.bounds())
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Pointer pressed at container position `(x, y)`.
    ///
    /// `target` is a `{ kind, node }` object from the renderer; when it is
    /// omitted the target is hit-tested.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        client_x: f64,
        client_y: f64,
        target: JsValue,
    ) -> std::result::Result<JsValue, JsValue> {
        let position = Point::new(x, y);
        let target = if target.is_undefined() || target.is_null() {
            self.viewer.hit_test(position)
        } else {
            serde_wasm_bindgen::from_value::<PointerTarget>(target)
                .map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        self.dispatch(InteractionEvent::PointerDown {
            position,
            client: Point::new(client_x, client_y),
            target,
        })
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        client_x: f64,
        client_y: f64,
    ) -> std::result::Result<JsValue, JsValue> {
        self.dispatch(InteractionEvent::PointerMove {
            position: Point::new(x, y),
            client: Point::new(client_x, client_y),
        })
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> std::result::Result<JsValue, JsValue> {
        self.dispatch(InteractionEvent::PointerUp)
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) -> std::result::Result<JsValue, JsValue> {
        self.dispatch(InteractionEvent::PointerLeave)
    }

    /// Wheel at container position `(x, y)`.
    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> std::result::Result<JsValue, JsValue> {
        self.dispatch(InteractionEvent::Wheel {
            position: Point::new(x, y),
            delta_y,
        })
    }

    /// Double-click or collapse button on a node.
    pub fn activate(&mut self, id: JsValue) -> std::result::Result<JsValue, JsValue> {
        match node_id_from_js(&id) {
            Some(node) => self.dispatch(InteractionEvent::Activate { node }),
            None => to_js(&ViewUpdate::None),
        }
    }

    /// What a pointer-down at container position `(x, y)` would hit.
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, x: f64, y: f64) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.viewer.hit_test(Point::new(x, y)))
    }

    /// Full snapshot for a redraw.
    pub fn frame(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.viewer.frame())
    }

    fn dispatch(&mut self, event: InteractionEvent) -> std::result::Result<JsValue, JsValue> {
        let update = self.viewer.handle_event(event);
        to_js(&update)
    }
}

// ============================================================================
// JS Boundary
// ============================================================================

fn to_js_error(err: TreeError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Serialize with plain objects instead of JS `Map`s.
fn to_js<T: Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn records_from_js(data: JsValue) -> std::result::Result<Vec<Map<String, Value>>, JsValue> {
    if data.is_undefined() || data.is_null() {
        return Ok(Vec::new());
    }
    serde_wasm_bindgen::from_value(data).map_err(|e| {
        to_js_error(TreeError::InvalidOptions {
            message: format!("data: {e}"),
        })
    })
}

fn node_id_from_js(id: &JsValue) -> Option<NodeId> {
    let value: Value = serde_wasm_bindgen::from_value(id.clone()).ok()?;
    let id = NodeId::from_json(&value);
    if id.is_none() {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "tree viewer: {value} is not a valid node id"
        )));
    }
    id
}

fn container_size(container_id: &str) -> Result<ContainerSize> {
    let not_found = || TreeError::ContainerNotFound {
        id: container_id.to_string(),
    };
    let element = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(container_id))
        .ok_or_else(not_found)?;
    let rect = element.get_bounding_client_rect();
    Ok(ContainerSize::new(rect.width(), rect.height()))
}
