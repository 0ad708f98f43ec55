//! Interaction state and its transitions.

use super::hover::{HoverItem, HoverPopup, HoverState, popup_position};
use super::{Effect, MouseEvent, MouseEventKind, MousePayload, SceneView, Transition};
use crate::camera::{DOUBLE_CLICK_WHEEL_DELTA, screen_edge_pan};
use crate::graph::{EdgeTable, NodeKey, NodeTable};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::options::InteractionOptions;
use crate::shape::{HandleKind, Shape, apply_handle_drag, handle_at, shape_at};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Idle,
    Pan,
    DragNodes,
    ShapeDown,
    ShapeDrag,
    HandleDown,
    HandleDrag,
    EdgeDown,
}

/// Which entities pointer presses act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Graph,
    Shapes,
    Disabled,
}

impl Mode {
    fn of(options: &InteractionOptions) -> Self {
        if options.allow_graph_interaction {
            Mode::Graph
        } else if options.allow_shape_interaction {
            Mode::Shapes
        } else {
            Mode::Disabled
        }
    }
}

/// Where a shape or handle drag started. Moves are applied to the original
/// rectangle with the total delta, so rounding never accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShapeGrab {
    start: Point,
    original: Rect,
}

/// State of the pointer interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    action: Action,
    /// Nodes moved by the current drag; the last one leads.
    dragged_nodes: Vec<NodeKey>,
    /// Pointer position relative to the lead node, in world units.
    grab_offset: Vec2,
    /// Persisted node selection, in selection order.
    selection: Vec<NodeKey>,
    /// Selected shape id.
    shape: Option<String>,
    shape_handle: Option<HandleKind>,
    shape_grab: Option<ShapeGrab>,
    mouse_moved: bool,
    shape_changed: bool,
    hover: HoverState,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn dragged_nodes(&self) -> &[NodeKey] {
        &self.dragged_nodes
    }

    pub fn selection(&self) -> &[NodeKey] {
        &self.selection
    }

    pub fn selected_shape(&self) -> Option<&str> {
        self.shape.as_deref()
    }

    pub fn shape_handle(&self) -> Option<HandleKind> {
        self.shape_handle
    }

    pub fn mouse_moved(&self) -> bool {
        self.mouse_moved
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    /// Feed a pointer event. `movement` is the screen distance the pointer
    /// travelled since the previous event.
    pub fn on_pointer(
        self,
        scene: &SceneView<'_>,
        event: &PointerEvent,
        movement: Vec2,
    ) -> Transition {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                if *button != MouseButton::Left {
                    log::debug!("Ignoring {button:?} button press");
                    return Transition::new(self);
                }
                self.pointer_down(scene, *position, *modifiers)
            }
            PointerEvent::Move { position, modifiers } => {
                self.pointer_move(scene, *position, movement, *modifiers)
            }
            PointerEvent::Up { button, .. } => {
                if *button != MouseButton::Left {
                    return Transition::new(self);
                }
                self.pointer_up(scene)
            }
            PointerEvent::Leave => self.pointer_leave(),
            PointerEvent::DoubleClick { position } => self.double_click(scene, *position),
            PointerEvent::Wheel { position, delta } => {
                Transition::new(self).with(Effect::WheelZoom {
                    position: *position,
                    delta_y: delta.y,
                })
            }
        }
    }

    fn pointer_down(
        mut self,
        scene: &SceneView<'_>,
        position: Point,
        modifiers: Modifiers,
    ) -> Transition {
        self.mouse_moved = false;
        self.shape_changed = false;
        match Mode::of(&scene.options.interaction) {
            Mode::Graph => self.graph_down(scene, position, modifiers),
            Mode::Shapes => self.shape_down(scene, position),
            Mode::Disabled => Transition::new(self),
        }
    }

    fn graph_down(
        mut self,
        scene: &SceneView<'_>,
        position: Point,
        modifiers: Modifiers,
    ) -> Transition {
        self.hover.clear();
        self.dragged_nodes.clear();

        if let Some(key) = scene.node_at(position) {
            let Some(node) = scene.node_position(key) else {
                return Transition::new(self);
            };
            if modifiers.is_additive() {
                self.selection.retain(|&k| k != key && scene.nodes.contains_key(k));
            } else {
                self.selection.clear();
            }
            self.selection.push(key);
            self.dragged_nodes = self.selection.clone();
            self.grab_offset = scene.to_world(position) - node.position;
            self.action = Action::DragNodes;
            log::debug!("Dragging {} node(s), lead {}", self.dragged_nodes.len(), node.id);
            let event = MouseEvent::new(MouseEventKind::NodeClick, MousePayload::Node(node));
            return Transition::new(self).with(Effect::Emit(event));
        }

        if let Some(id) = scene.edge_at(position).and_then(|key| scene.edge_id(key)) {
            self.action = Action::EdgeDown;
            let event = MouseEvent::new(MouseEventKind::EdgeClick, MousePayload::Edge { id });
            return Transition::new(self).with(Effect::Emit(event));
        }

        self.action = Action::Pan;
        Transition::new(self)
    }

    fn shape_down(mut self, scene: &SceneView<'_>, position: Point) -> Transition {
        let world = scene.to_world(position);

        let selected = self
            .shape
            .as_deref()
            .and_then(|id| scene.shapes.iter().find(|shape| shape.id == id));
        if let Some(shape) = selected {
            if let Some(handle) = handle_at(shape, world, scene.camera.scale) {
                self.action = Action::HandleDown;
                self.shape_handle = Some(handle);
                self.shape_grab = Some(ShapeGrab {
                    start: world,
                    original: shape.rect(),
                });
                return Transition::new(self);
            }
        }

        self.shape_handle = None;
        match shape_at(scene.shapes, world) {
            Some(shape) => {
                self.action = Action::ShapeDown;
                self.shape = Some(shape.id.clone());
                self.shape_grab = Some(ShapeGrab {
                    start: world,
                    original: shape.rect(),
                });
                let payload = MousePayload::Shape {
                    shape: shape.clone(),
                };
                let event = MouseEvent::new(MouseEventKind::ShapeClick, payload);
                Transition::new(self)
                    .with(Effect::Emit(event))
                    .with(Effect::BringShapeToFront(shape.id.clone()))
            }
            None => {
                self.action = Action::Pan;
                self.shape = None;
                self.shape_grab = None;
                let event = MouseEvent::new(MouseEventKind::BackgroundClick, MousePayload::None);
                Transition::new(self).with(Effect::Emit(event))
            }
        }
    }

    fn pointer_move(
        mut self,
        scene: &SceneView<'_>,
        position: Point,
        movement: Vec2,
        modifiers: Modifiers,
    ) -> Transition {
        let moved = movement != Vec2::ZERO;
        match self.action {
            Action::DragNodes => self.drag_nodes(scene, position, moved),
            Action::Pan => {
                self.mouse_moved |= moved;
                if !moved {
                    return Transition::new(self);
                }
                Transition::new(self).with(Effect::PanCamera(movement))
            }
            Action::ShapeDown | Action::ShapeDrag => {
                self.action = Action::ShapeDrag;
                self.mouse_moved |= moved;
                self.reshape(scene, position, |grab, delta| grab.original + delta)
            }
            Action::HandleDown | Action::HandleDrag => {
                self.action = Action::HandleDrag;
                self.mouse_moved |= moved;
                let Some(handle) = self.shape_handle else {
                    return Transition::new(self);
                };
                let constrained = modifiers.is_additive();
                self.reshape(scene, position, |grab, delta| {
                    apply_handle_drag(grab.original, handle, delta, constrained)
                })
            }
            Action::Idle | Action::EdgeDown => {
                if Mode::of(&scene.options.interaction) != Mode::Graph {
                    return Transition::new(self);
                }
                self.track_hover(scene, position)
            }
        }
    }

    fn drag_nodes(mut self, scene: &SceneView<'_>, position: Point, moved: bool) -> Transition {
        let lead = self
            .dragged_nodes
            .last()
            .and_then(|&key| scene.nodes.get(key))
            .map(|node| node.position);
        let Some(lead) = lead else {
            return Transition::new(self);
        };
        self.mouse_moved |= moved;

        let target = scene.to_world(position) - self.grab_offset;
        let delta = target - lead;
        let camera = &scene.options.camera;
        let edge_pan = screen_edge_pan(
            position,
            scene.screen,
            camera.edge_pan_margin,
            camera.edge_pan_speed,
            scene.camera.scale,
        );
        let nodes = self.dragged_nodes.clone();
        Transition::new(self)
            .with(Effect::MoveNodes { nodes, delta })
            .with(Effect::SetEdgePan(edge_pan))
    }

    /// Resize or move the selected shape from its original rectangle.
    fn reshape(
        mut self,
        scene: &SceneView<'_>,
        position: Point,
        apply: impl Fn(&ShapeGrab, Vec2) -> Rect,
    ) -> Transition {
        let shape = self
            .shape
            .as_deref()
            .and_then(|id| scene.shapes.iter().find(|shape| shape.id == id));
        let (Some(shape), Some(grab)) = (shape, self.shape_grab) else {
            return Transition::new(self);
        };
        if shape.no_edit {
            return Transition::new(self);
        }
        let rect = apply(&grab, scene.to_world(position) - grab.start);
        if rect == shape.rect() {
            return Transition::new(self);
        }
        let id = shape.id.clone();
        self.shape_changed = true;
        Transition::new(self).with(Effect::SetShapeRect { id, rect })
    }

    fn track_hover(mut self, scene: &SceneView<'_>, position: Point) -> Transition {
        let offset = scene.options.hover.offset;
        let node = scene.node_at(position).and_then(|key| scene.nodes.get(key));
        let target = if let Some(node) = node {
            let anchor = scene.camera.world_to_screen(node.position);
            Some(HoverPopup {
                item: HoverItem::Node(node.id().to_string()),
                position: popup_position(anchor, offset, scene.screen),
            })
        } else {
            scene
                .edge_at(position)
                .and_then(|key| scene.edge_id(key))
                .map(|id| HoverPopup {
                    item: HoverItem::Edge(id),
                    position: popup_position(position, offset, scene.screen),
                })
        };
        let delay = Duration::from_millis(scene.options.hover.delay_ms);
        let hidden = self.hover.track(target, delay);
        Transition::new(self).emit(hidden)
    }

    fn pointer_up(mut self, scene: &SceneView<'_>) -> Transition {
        let event = match self.action {
            Action::DragNodes if self.mouse_moved && !self.dragged_nodes.is_empty() => {
                let nodes = self
                    .dragged_nodes
                    .iter()
                    .filter_map(|&key| scene.node_position(key))
                    .collect();
                log::debug!("Drag finished");
                Some(MouseEvent::new(MouseEventKind::NodesDragged, MousePayload::Nodes { nodes }))
            }
            Action::Pan
                if !self.mouse_moved && Mode::of(&scene.options.interaction) == Mode::Graph =>
            {
                self.selection.clear();
                Some(MouseEvent::new(MouseEventKind::BackgroundClick, MousePayload::None))
            }
            Action::ShapeDown | Action::ShapeDrag | Action::HandleDown | Action::HandleDrag
                if self.shape_changed =>
            {
                let shapes = scene.shapes.to_vec();
                Some(MouseEvent::new(MouseEventKind::ShapeUpdate, MousePayload::Shapes { shapes }))
            }
            _ => None,
        };
        self.release();
        Transition::new(self).with(Effect::SetEdgePan(None)).emit(event)
    }

    fn pointer_leave(mut self) -> Transition {
        self.release();
        let hidden = self.hover.cancel();
        Transition::new(self).with(Effect::SetEdgePan(None)).emit(hidden)
    }

    fn double_click(self, scene: &SceneView<'_>, position: Point) -> Transition {
        if Mode::of(&scene.options.interaction) != Mode::Graph {
            return Transition::new(self);
        }
        if let Some(node) = scene.node_at(position).and_then(|key| scene.node_position(key)) {
            let event = MouseEvent::new(MouseEventKind::NodeDblClick, MousePayload::Node(node));
            return Transition::new(self).with(Effect::Emit(event));
        }
        if let Some(id) = scene.edge_at(position).and_then(|key| scene.edge_id(key)) {
            let event = MouseEvent::new(MouseEventKind::EdgeDblClick, MousePayload::Edge { id });
            return Transition::new(self).with(Effect::Emit(event));
        }
        let (pan, scale) = scene.camera.wheel_target(
            position,
            DOUBLE_CLICK_WHEEL_DELTA,
            scene.options.camera.wheel_sensitivity,
        );
        Transition::new(self).with(Effect::AnimateCamera { pan, scale })
    }

    /// Advance the hover countdown.
    pub fn advance_hover(mut self, dt: Duration) -> Transition {
        let shown = self.hover.advance(dt);
        Transition::new(self).emit(shown)
    }

    /// End the current gesture without reporting anything.
    fn release(&mut self) {
        self.action = Action::Idle;
        self.dragged_nodes.clear();
        self.shape_handle = None;
        self.shape_grab = None;
        self.mouse_moved = false;
        self.shape_changed = false;
    }

    /// Drop references to entities that no longer exist.
    pub fn retain_existing(&mut self, nodes: &NodeTable, edges: &EdgeTable, shapes: &[Shape]) {
        self.dragged_nodes.retain(|&key| nodes.contains_key(key));
        self.selection.retain(|&key| nodes.contains_key(key));
        if self
            .shape
            .as_deref()
            .is_some_and(|id| !shapes.iter().any(|shape| shape.id == id))
        {
            self.shape = None;
            if matches!(
                self.action,
                Action::ShapeDown | Action::ShapeDrag | Action::HandleDown | Action::HandleDrag
            ) {
                self.release();
            }
        }
        self.hover.retain(|item| match item {
            HoverItem::Node(id) => nodes.key_of(id).is_some(),
            HoverItem::Edge(id) => edges.key_of(id).is_some(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::graph::{EdgeDef, Graph, NodeDef};
    use crate::options::NetworkOptions;
    use crate::reconcile::GraphReconciler;
    use kurbo::Size;

    const EPS: f64 = 1e-9;

    struct Fixture {
        reconciler: GraphReconciler,
        camera: Camera,
        options: NetworkOptions,
    }

    impl Fixture {
        fn new(scale: f64) -> Self {
            let graph = Graph::new(
                [
                    NodeDef::new("n1").at(0.0, 0.0),
                    NodeDef::new("n2").at(100.0, 0.0),
                    NodeDef::new("n3").at(0.0, 200.0),
                ],
                [EdgeDef::new("e", "n2", "n3")],
            );
            let shapes = vec![
                Shape::new("back", 300.0, 300.0, 100.0, 100.0),
                Shape::new("locked", 500.0, 300.0, 100.0, 100.0).locked(),
            ];
            let mut reconciler = GraphReconciler::new();
            reconciler.reconcile(&graph, shapes, 10.0, None).unwrap();
            let mut camera = Camera::new();
            camera.set(Vec2::new(50.0, 50.0), scale);
            Self {
                reconciler,
                camera,
                options: NetworkOptions::default(),
            }
        }

        fn shape_mode(mut self) -> Self {
            self.options.interaction.allow_graph_interaction = false;
            self.options.interaction.allow_shape_interaction = true;
            self
        }

        fn scene(&self) -> SceneView<'_> {
            SceneView {
                nodes: self.reconciler.nodes(),
                edges: self.reconciler.edges(),
                shapes: self.reconciler.shapes(),
                camera: &self.camera,
                options: &self.options,
                screen: Size::new(800.0, 600.0),
            }
        }

        fn screen(&self, x: f64, y: f64) -> Point {
            self.camera.world_to_screen(Point::new(x, y))
        }

        fn key(&self, id: &str) -> NodeKey {
            self.reconciler.nodes().key_of(id).unwrap()
        }
    }

    fn down(position: Point) -> PointerEvent {
        PointerEvent::Down {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    fn down_with(position: Point, modifiers: Modifiers) -> PointerEvent {
        PointerEvent::Down {
            position,
            button: MouseButton::Left,
            modifiers,
        }
    }

    fn move_to(position: Point) -> PointerEvent {
        PointerEvent::Move {
            position,
            modifiers: Modifiers::default(),
        }
    }

    fn up(position: Point) -> PointerEvent {
        PointerEvent::Up {
            position,
            button: MouseButton::Left,
        }
    }

    fn events(transition: &Transition) -> Vec<MouseEventKind> {
        transition
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Emit(event) => Some(event.kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_press_on_node_starts_drag() {
        let fixture = Fixture::new(2.0);
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(1.0, 1.0)), Vec2::ZERO);
        assert_eq!(t.state.action(), Action::DragNodes);
        assert_eq!(t.state.dragged_nodes(), &[fixture.key("n1")]);
        assert_eq!(events(&t), vec![MouseEventKind::NodeClick]);
    }

    #[test]
    fn test_drag_moves_by_screen_delta_over_scale() {
        let fixture = Fixture::new(2.0);
        let scene = fixture.scene();
        let start = fixture.screen(3.0, -2.0);
        let t = InteractionState::new().on_pointer(&scene, &down(start), Vec2::ZERO);
        let t = t
            .state
            .on_pointer(&scene, &move_to(start + Vec2::new(10.0, 10.0)), Vec2::new(10.0, 10.0));

        let Some(Effect::MoveNodes { nodes, delta }) = t.effects.first() else {
            panic!("Expected a node move, got {:?}", t.effects);
        };
        assert_eq!(nodes, &vec![fixture.key("n1")]);
        assert!((delta.x - 5.0).abs() < EPS);
        assert!((delta.y - 5.0).abs() < EPS);
        assert!(t.state.mouse_moved());
    }

    #[test]
    fn test_modifier_drags_selection_rigidly() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let additive = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let t = t.state.on_pointer(&scene, &up(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let t = t
            .state
            .on_pointer(&scene, &down_with(fixture.screen(100.0, 0.0), additive), Vec2::ZERO);
        assert_eq!(t.state.dragged_nodes(), &[fixture.key("n1"), fixture.key("n2")]);

        let t = t
            .state
            .on_pointer(&scene, &move_to(fixture.screen(110.0, 5.0)), Vec2::new(10.0, 5.0));
        let Some(Effect::MoveNodes { nodes, delta }) = t.effects.first() else {
            panic!("Expected a node move");
        };
        assert_eq!(nodes.len(), 2);
        assert!((delta.x - 10.0).abs() < EPS);
        assert!((delta.y - 5.0).abs() < EPS);
    }

    #[test]
    fn test_release_after_drag_reports_nodes() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let t = t.state.on_pointer(&scene, &move_to(fixture.screen(5.0, 0.0)), Vec2::new(5.0, 0.0));
        let t = t.state.on_pointer(&scene, &up(fixture.screen(5.0, 0.0)), Vec2::ZERO);
        assert_eq!(events(&t), vec![MouseEventKind::NodesDragged]);
        assert!(t.effects.contains(&Effect::SetEdgePan(None)));
        assert_eq!(t.state.action(), Action::Idle);
        assert!(t.state.dragged_nodes().is_empty());
    }

    #[test]
    fn test_click_without_move_reports_only_node_click() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let t = t.state.on_pointer(&scene, &up(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        assert!(events(&t).is_empty());
        assert_eq!(t.state.selection(), &[fixture.key("n1")]);
    }

    #[test]
    fn test_background_click_and_pan() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let empty = fixture.screen(-300.0, -300.0);

        let t = InteractionState::new().on_pointer(&scene, &down(empty), Vec2::ZERO);
        assert_eq!(t.state.action(), Action::Pan);
        assert!(events(&t).is_empty());
        let t = t.state.on_pointer(&scene, &up(empty), Vec2::ZERO);
        assert_eq!(events(&t), vec![MouseEventKind::BackgroundClick]);

        let t = t.state.on_pointer(&scene, &down(empty), Vec2::ZERO);
        let step = Vec2::new(7.0, 3.0);
        let t = t.state.on_pointer(&scene, &move_to(empty + step), step);
        assert_eq!(t.effects, vec![Effect::PanCamera(Vec2::new(7.0, 3.0))]);
        let t = t.state.on_pointer(&scene, &up(empty), Vec2::ZERO);
        assert!(events(&t).is_empty());
    }

    #[test]
    fn test_edge_press_reports_edge_click_only() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        // Midpoint of n2 (100, 0) -> n3 (0, 200).
        let on_edge = fixture.screen(50.0, 100.0);
        let t = InteractionState::new().on_pointer(&scene, &down(on_edge), Vec2::ZERO);
        assert_eq!(t.state.action(), Action::EdgeDown);
        assert_eq!(events(&t), vec![MouseEventKind::EdgeClick]);
        let t = t.state.on_pointer(&scene, &up(on_edge), Vec2::ZERO);
        assert!(events(&t).is_empty());
    }

    #[test]
    fn test_drag_near_border_sets_edge_pan() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let border = Point::new(5.0, 300.0);
        let t = t.state.on_pointer(&scene, &move_to(border), Vec2::new(-45.0, 250.0));
        let edge_pan = t.effects.iter().find_map(|effect| match effect {
            Effect::SetEdgePan(pan) => Some(*pan),
            _ => None,
        });
        let pan = edge_pan.flatten().unwrap();
        assert!(pan.x > 0.0);
        assert!(pan.y.abs() < EPS);
    }

    #[test]
    fn test_leave_releases_drag() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let t = t.state.on_pointer(&scene, &PointerEvent::Leave, Vec2::ZERO);
        assert_eq!(t.state.action(), Action::Idle);
        assert!(t.state.dragged_nodes().is_empty());
        assert_eq!(t.effects, vec![Effect::SetEdgePan(None)]);
    }

    #[test]
    fn test_double_click() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let on_node = PointerEvent::DoubleClick {
            position: fixture.screen(0.0, 0.0),
        };
        let t = InteractionState::new().on_pointer(&scene, &on_node, Vec2::ZERO);
        assert_eq!(events(&t), vec![MouseEventKind::NodeDblClick]);

        let on_background = PointerEvent::DoubleClick {
            position: fixture.screen(-300.0, -300.0),
        };
        let t = t.state.on_pointer(&scene, &on_background, Vec2::ZERO);
        let Some(Effect::AnimateCamera { scale, .. }) = t.effects.first() else {
            panic!("Expected an animated zoom");
        };
        assert!(*scale > fixture.camera.scale);
    }

    #[test]
    fn test_hover_shows_after_dwell() {
        let fixture = Fixture::new(1.0);
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &move_to(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        assert!(t.state.hover().is_pending());
        let t = t.state.advance_hover(Duration::from_millis(749));
        assert!(events(&t).is_empty());
        let t = t.state.advance_hover(Duration::from_millis(1));
        assert_eq!(events(&t), vec![MouseEventKind::HoverShow]);

        let away = fixture.screen(-300.0, -300.0);
        let t = t.state.on_pointer(&scene, &move_to(away), Vec2::new(-300.0, -300.0));
        assert_eq!(events(&t), vec![MouseEventKind::HoverHide]);
    }

    #[test]
    fn test_shape_press_selects_and_raises() {
        let fixture = Fixture::new(1.0).shape_mode();
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(350.0, 350.0)), Vec2::ZERO);
        assert_eq!(t.state.action(), Action::ShapeDown);
        assert_eq!(t.state.selected_shape(), Some("back"));
        assert_eq!(events(&t), vec![MouseEventKind::ShapeClick]);
        assert!(t.effects.contains(&Effect::BringShapeToFront("back".into())));
    }

    #[test]
    fn test_shape_drag_and_update() {
        let fixture = Fixture::new(2.0).shape_mode();
        let scene = fixture.scene();
        let start = fixture.screen(350.0, 350.0);
        let t = InteractionState::new().on_pointer(&scene, &down(start), Vec2::ZERO);
        let t = t
            .state
            .on_pointer(&scene, &move_to(start + Vec2::new(20.0, 10.0)), Vec2::new(20.0, 10.0));
        let Some(Effect::SetShapeRect { id, rect }) = t.effects.first() else {
            panic!("Expected a shape move");
        };
        assert_eq!(id, "back");
        assert!((rect.x0 - 310.0).abs() < EPS);
        assert!((rect.y0 - 305.0).abs() < EPS);

        let t = t.state.on_pointer(&scene, &up(start), Vec2::ZERO);
        assert_eq!(events(&t), vec![MouseEventKind::ShapeUpdate]);
        assert_eq!(t.state.selected_shape(), Some("back"));
    }

    #[test]
    fn test_locked_shape_does_not_move() {
        let fixture = Fixture::new(1.0).shape_mode();
        let scene = fixture.scene();
        let start = fixture.screen(550.0, 350.0);
        let t = InteractionState::new().on_pointer(&scene, &down(start), Vec2::ZERO);
        let t = t
            .state
            .on_pointer(&scene, &move_to(start + Vec2::new(20.0, 0.0)), Vec2::new(20.0, 0.0));
        assert!(t.effects.is_empty());
        let t = t.state.on_pointer(&scene, &up(start), Vec2::ZERO);
        assert!(events(&t).is_empty());
    }

    #[test]
    fn test_handle_of_selected_shape() {
        let fixture = Fixture::new(1.0).shape_mode();
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(350.0, 350.0)), Vec2::ZERO);
        let t = t.state.on_pointer(&scene, &up(fixture.screen(350.0, 350.0)), Vec2::ZERO);

        let corner = fixture.screen(400.0, 400.0);
        let t = t.state.on_pointer(&scene, &down(corner), Vec2::ZERO);
        assert_eq!(t.state.action(), Action::HandleDown);
        let t = t
            .state
            .on_pointer(&scene, &move_to(corner + Vec2::new(10.0, 20.0)), Vec2::new(10.0, 20.0));
        assert_eq!(t.state.action(), Action::HandleDrag);
        let Some(Effect::SetShapeRect { rect, .. }) = t.effects.first() else {
            panic!("Expected a resize");
        };
        assert!((rect.width() - 110.0).abs() < EPS);
        assert!((rect.height() - 120.0).abs() < EPS);
    }

    #[test]
    fn test_shape_mode_background_press() {
        let fixture = Fixture::new(1.0).shape_mode();
        let scene = fixture.scene();
        let t = InteractionState::new()
            .on_pointer(&scene, &down(fixture.screen(350.0, 350.0)), Vec2::ZERO);
        let t = t.state.on_pointer(&scene, &up(fixture.screen(350.0, 350.0)), Vec2::ZERO);

        let empty = fixture.screen(-300.0, -300.0);
        let t = t.state.on_pointer(&scene, &down(empty), Vec2::ZERO);
        assert_eq!(t.state.action(), Action::Pan);
        assert_eq!(t.state.selected_shape(), None);
        assert_eq!(events(&t), vec![MouseEventKind::BackgroundClick]);
        let t = t.state.on_pointer(&scene, &up(empty), Vec2::ZERO);
        assert!(events(&t).is_empty());
    }

    #[test]
    fn test_retain_existing_drops_stale_keys() {
        let mut fixture = Fixture::new(1.0);
        let t = InteractionState::new()
            .on_pointer(&fixture.scene(), &down(fixture.screen(0.0, 0.0)), Vec2::ZERO);
        let mut state = t.state;

        let next = Graph::new([NodeDef::new("n2")], Vec::<EdgeDef>::new());
        fixture.reconciler.reconcile(&next, Vec::new(), 10.0, None).unwrap();
        let reconciler = &fixture.reconciler;
        state.retain_existing(reconciler.nodes(), reconciler.edges(), reconciler.shapes());
        assert!(state.dragged_nodes().is_empty());
        assert!(state.selection().is_empty());
    }
}
