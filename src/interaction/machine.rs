//! Pointer state machine.
//!
//! Decides, per event, whether the gesture in progress pans the canvas, drags
//! a node, or toggles a collapse, and applies the change to the tree model and
//! viewport it is handed.

use crate::geometry::Point;
use crate::tree::{NodeId, TreeModel};
use crate::viewport::{ViewportController, ZOOM_STEP};

use super::event::{Effect, InteractionEvent, PointerTarget};

/// Current gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Canvas pan; `anchor` is the pointer position minus the pan at
    /// pointer-down, in container pixels.
    Panning { anchor: Point },
    /// Node drag; `last_client` is the client position of the previous move.
    DraggingNode {
        node: NodeId,
        last_client: Point,
        moved: bool,
    },
}

/// Toggles that gate interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionOptions {
    /// Allow collapse/expand through `Activate` events.
    pub collapse_child: bool,
    /// Allow nodes to be dragged.
    pub draggable: bool,
    /// Zoom factor per wheel tick.
    pub zoom_step: f64,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            collapse_child: false,
            draggable: true,
            zoom_step: ZOOM_STEP,
        }
    }
}

/// The interaction state machine.
#[derive(Debug, Clone, Default)]
pub struct InteractionMachine {
    state: InteractionState,
    options: InteractionOptions,
}

impl InteractionMachine {
    pub fn new(options: InteractionOptions) -> Self {
        Self {
            state: InteractionState::Idle,
            options,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn options(&self) -> &InteractionOptions {
        &self.options
    }

    /// Drop any gesture in progress without reporting it.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Feed one event through the machine.
    pub fn handle(
        &mut self,
        event: InteractionEvent,
        model: &mut TreeModel,
        viewport: &mut ViewportController,
    ) -> Effect {
        match event {
            InteractionEvent::PointerDown {
                position,
                client,
                target,
            } => self.pointer_down(position, client, target, model, viewport),
            InteractionEvent::PointerMove { position, client } => {
                self.pointer_move(position, client, model, viewport)
            }
            InteractionEvent::PointerUp | InteractionEvent::PointerLeave => self.release(model),
            InteractionEvent::Wheel { position, delta_y } => {
                self.wheel(position, delta_y, viewport)
            }
            InteractionEvent::Activate { node } => self.activate(node, model),
        }
    }

    fn pointer_down(
        &mut self,
        position: Point,
        client: Point,
        target: PointerTarget,
        model: &mut TreeModel,
        viewport: &ViewportController,
    ) -> Effect {
        if self.state != InteractionState::Idle {
            return Effect::None;
        }

        let start_pan = |state: &mut InteractionState| {
            let t = viewport.transform();
            *state = InteractionState::Panning {
                anchor: Point::new(position.x - t.pan_x, position.y - t.pan_y),
            };
            Effect::None
        };

        match target {
            PointerTarget::Canvas => start_pan(&mut self.state),
            PointerTarget::DragHandle(_) if !self.options.draggable => start_pan(&mut self.state),
            PointerTarget::DragHandle(id) => match model.get_mut(&id) {
                Some(node) => {
                    node.state.set_dragging(true);
                    self.state = InteractionState::DraggingNode {
                        node: id.clone(),
                        last_client: client,
                        moved: false,
                    };
                    Effect::DragStarted(id)
                }
                None => {
                    tracing::debug!(%id, "drag on unknown node ignored");
                    Effect::None
                }
            },
            PointerTarget::CollapseToggle(_) => Effect::None,
        }
    }

    fn pointer_move(
        &mut self,
        position: Point,
        client: Point,
        model: &mut TreeModel,
        viewport: &mut ViewportController,
    ) -> Effect {
        match &mut self.state {
            InteractionState::Idle => Effect::None,
            InteractionState::Panning { anchor } => {
                viewport.set_pan(position.x - anchor.x, position.y - anchor.y);
                Effect::TransformChanged
            }
            InteractionState::DraggingNode {
                node,
                last_client,
                moved,
            } => {
                let scale = viewport.scale();
                let dx = (client.x - last_client.x) / scale;
                let dy = (client.y - last_client.y) / scale;
                *last_client = client;

                let Some(target) = model.get_mut(node) else {
                    tracing::debug!(id = %node, "dragged node vanished, ending drag");
                    self.state = InteractionState::Idle;
                    return Effect::None;
                };
                if (dx == 0.0 && dy == 0.0) || !target.translate(dx, dy) {
                    return Effect::None;
                }
                *moved = true;
                Effect::NodeMoved(node.clone())
            }
        }
    }

    fn release(&mut self, model: &mut TreeModel) -> Effect {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle | InteractionState::Panning { .. } => Effect::None,
            InteractionState::DraggingNode { node, moved, .. } => {
                if let Some(target) = model.get_mut(&node) {
                    target.state.set_dragging(false);
                }
                Effect::DragEnded { node, moved }
            }
        }
    }

    fn wheel(&mut self, position: Point, delta_y: f64, viewport: &mut ViewportController) -> Effect {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return Effect::None;
        }
        // scrolling down zooms out
        let factor = if delta_y > 0.0 {
            1.0 / self.options.zoom_step
        } else {
            self.options.zoom_step
        };
        if viewport.zoom_around_point(position, factor) {
            Effect::TransformChanged
        } else {
            Effect::None
        }
    }

    fn activate(&mut self, id: NodeId, model: &mut TreeModel) -> Effect {
        if !self.options.collapse_child {
            return Effect::None;
        }
        match model.index_of(&id) {
            Some(index) if model.has_children(index) => {
                model.toggle_collapse(&id);
                Effect::CollapseToggled(id)
            }
            _ => Effect::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TreeLayout;
    use crate::tree::RecordFields;
    use serde_json::{Map, Value, json};

    fn setup() -> (TreeModel, ViewportController) {
        let records: Vec<Map<String, Value>> = json!([
            {"id": 1},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": 1},
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();
        let mut model = TreeModel::build(&records, &RecordFields::default()).unwrap();
        TreeLayout::with_defaults().compute(&model).apply(&mut model);
        (model, ViewportController::new())
    }

    fn down(x: f64, y: f64, target: PointerTarget) -> InteractionEvent {
        InteractionEvent::PointerDown {
            position: Point::new(x, y),
            client: Point::new(x + 8.0, y + 30.0),
            target,
        }
    }

    fn moved(x: f64, y: f64) -> InteractionEvent {
        InteractionEvent::PointerMove {
            position: Point::new(x, y),
            client: Point::new(x + 8.0, y + 30.0),
        }
    }

    #[test]
    fn test_canvas_pan() {
        let (mut model, mut viewport) = setup();
        viewport.set_transform(2.0, 10.0, 10.0);
        let mut machine = InteractionMachine::default();

        machine.handle(down(100.0, 100.0, PointerTarget::Canvas), &mut model, &mut viewport);
        assert_eq!(
            machine.state(),
            &InteractionState::Panning {
                anchor: Point::new(90.0, 90.0)
            }
        );

        let effect = machine.handle(moved(130.0, 80.0), &mut model, &mut viewport);
        assert_eq!(effect, Effect::TransformChanged);
        let t = viewport.transform();
        // container pixels, not divided by scale
        assert_eq!((t.scale, t.pan_x, t.pan_y), (2.0, 40.0, -10.0));

        machine.handle(InteractionEvent::PointerUp, &mut model, &mut viewport);
        assert_eq!(machine.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_drag_node_divides_by_scale() {
        let (mut model, mut viewport) = setup();
        viewport.set_transform(2.0, 0.0, 0.0);
        let mut machine = InteractionMachine::default();
        let a = NodeId::from(2);

        let effect = machine.handle(
            down(10.0, 160.0, PointerTarget::DragHandle(a.clone())),
            &mut model,
            &mut viewport,
        );
        assert_eq!(effect, Effect::DragStarted(a.clone()));
        assert!(model.get(&a).unwrap().state.is_dragging());

        let effect = machine.handle(moved(50.0, 180.0), &mut model, &mut viewport);
        assert_eq!(effect, Effect::NodeMoved(a.clone()));

        let node = model.get(&a).unwrap();
        assert_eq!(node.position, Some(Point::new(20.0, 160.0)));
        assert!(node.is_manually_positioned());
        assert_eq!(viewport.transform().pan_x, 0.0);

        let effect = machine.handle(InteractionEvent::PointerUp, &mut model, &mut viewport);
        assert_eq!(effect, Effect::DragEnded { node: a.clone(), moved: true });
        assert!(!model.get(&a).unwrap().state.is_dragging());
    }

    #[test]
    fn test_drag_uses_delta_since_last_move() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();
        let b = NodeId::from(3);

        machine.handle(down(0.0, 0.0, PointerTarget::DragHandle(b.clone())), &mut model, &mut viewport);
        machine.handle(moved(10.0, 0.0), &mut model, &mut viewport);
        machine.handle(moved(25.0, 5.0), &mut model, &mut viewport);

        assert_eq!(model.get(&b).unwrap().position, Some(Point::new(225.0, 155.0)));
    }

    #[test]
    fn test_click_without_move_is_not_manual() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();
        let b = NodeId::from(3);

        machine.handle(down(0.0, 0.0, PointerTarget::DragHandle(b.clone())), &mut model, &mut viewport);
        let effect = machine.handle(InteractionEvent::PointerLeave, &mut model, &mut viewport);

        assert_eq!(effect, Effect::DragEnded { node: b.clone(), moved: false });
        assert!(!model.get(&b).unwrap().is_manually_positioned());
    }

    #[test]
    fn test_drag_disabled_pans_instead() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::new(InteractionOptions {
            draggable: false,
            ..Default::default()
        });

        machine.handle(
            down(5.0, 5.0, PointerTarget::DragHandle(NodeId::from(2))),
            &mut model,
            &mut viewport,
        );
        assert!(matches!(machine.state(), InteractionState::Panning { .. }));
    }

    #[test]
    fn test_stale_node_is_noop() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();

        let effect = machine.handle(
            down(0.0, 0.0, PointerTarget::DragHandle(NodeId::from(42))),
            &mut model,
            &mut viewport,
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(machine.state(), &InteractionState::Idle);

        // data reloaded mid-drag
        machine.handle(
            down(0.0, 0.0, PointerTarget::DragHandle(NodeId::from(2))),
            &mut model,
            &mut viewport,
        );
        let mut reloaded = TreeModel::new();
        let effect = machine.handle(moved(10.0, 10.0), &mut reloaded, &mut viewport);
        assert_eq!(effect, Effect::None);
        assert_eq!(machine.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_wheel_zoom_direction() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();
        let wheel = |delta_y| InteractionEvent::Wheel {
            position: Point::new(200.0, 100.0),
            delta_y,
        };

        assert_eq!(
            machine.handle(wheel(120.0), &mut model, &mut viewport),
            Effect::TransformChanged
        );
        assert!(viewport.scale() < 1.0);

        viewport.set_transform(1.0, 0.0, 0.0);
        machine.handle(wheel(-120.0), &mut model, &mut viewport);
        assert!((viewport.scale() - 1.1).abs() < 1e-12);

        assert_eq!(machine.handle(wheel(0.0), &mut model, &mut viewport), Effect::None);
    }

    #[test]
    fn test_wheel_during_pan_keeps_state() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();

        machine.handle(down(0.0, 0.0, PointerTarget::Canvas), &mut model, &mut viewport);
        machine.handle(
            InteractionEvent::Wheel {
                position: Point::new(0.0, 0.0),
                delta_y: 1.0,
            },
            &mut model,
            &mut viewport,
        );
        assert!(matches!(machine.state(), InteractionState::Panning { .. }));
    }

    #[test]
    fn test_wheel_during_drag_keeps_state() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::new(InteractionOptions {
            zoom_step: 2.0,
            ..InteractionOptions::default()
        });
        let a = NodeId::from(2);

        machine.handle(down(0.0, 0.0, PointerTarget::DragHandle(a.clone())), &mut model, &mut viewport);
        machine.handle(moved(10.0, 0.0), &mut model, &mut viewport);
        let effect = machine.handle(
            InteractionEvent::Wheel {
                position: Point::new(0.0, 0.0),
                delta_y: -1.0,
            },
            &mut model,
            &mut viewport,
        );
        assert_eq!(effect, Effect::TransformChanged);
        assert_eq!(
            machine.state(),
            &InteractionState::DraggingNode {
                node: a.clone(),
                last_client: Point::new(18.0, 30.0),
                moved: true,
            }
        );
        assert!(model.get(&a).unwrap().state.is_dragging());
        assert_eq!(viewport.scale(), 2.0);

        // later moves are divided by the new scale
        machine.handle(moved(30.0, 0.0), &mut model, &mut viewport);
        assert_eq!(model.get(&a).unwrap().position, Some(Point::new(20.0, 150.0)));
    }

    #[test]
    fn test_activate_toggles_collapse() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::new(InteractionOptions {
            collapse_child: true,
            ..Default::default()
        });

        let effect = machine.handle(
            InteractionEvent::Activate { node: NodeId::from(1) },
            &mut model,
            &mut viewport,
        );
        assert_eq!(effect, Effect::CollapseToggled(NodeId::from(1)));
        assert!(model.get(&NodeId::from(1)).unwrap().is_collapsed());

        // leaves have nothing to collapse
        let effect = machine.handle(
            InteractionEvent::Activate { node: NodeId::from(2) },
            &mut model,
            &mut viewport,
        );
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn test_activate_disabled() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();

        let effect = machine.handle(
            InteractionEvent::Activate { node: NodeId::from(1) },
            &mut model,
            &mut viewport,
        );
        assert_eq!(effect, Effect::None);
        assert!(!model.get(&NodeId::from(1)).unwrap().is_collapsed());
    }

    #[test]
    fn test_collapse_toggle_target_does_not_start_gesture() {
        let (mut model, mut viewport) = setup();
        let mut machine = InteractionMachine::default();
        machine.handle(
            down(0.0, 0.0, PointerTarget::CollapseToggle(NodeId::from(1))),
            &mut model,
            &mut viewport,
        );
        assert_eq!(machine.state(), &InteractionState::Idle);
    }
}
