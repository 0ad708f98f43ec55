//! The network: one interactive graph view.
//!
//! Owns the camera, the reconciled entities, the interaction state and the
//! layout run, and is the only place their effects are applied. Hosts feed
//! it input events and a frame tick, and read positions and the camera back.

use crate::camera::{Camera, CameraState, KeyAction};
use crate::error::{GraphResult, OptionsError};
use crate::geometry::{EdgeCurve, bounds_of, edge_curve};
use crate::graph::{EdgeKey, EdgeTable, Graph, NodeTable};
use crate::input::{InputEvent, InputState, KeyEvent, PointerEvent};
use crate::interaction::{
    Effect, HoverState, InteractionState, MouseEvent, NodePosition, SceneView, Transition,
};
use crate::layout::{ForceLayouter, LayoutContext, LayoutRun, Layouter};
use crate::options::NetworkOptions;
use crate::reconcile::{GraphReconciler, LayoutPredicate, ReconcileOutcome};
use crate::shape::{Shape, bring_to_front};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Zoom controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    In,
    Out,
    /// Fit every node and shape.
    All,
    /// Centre the selected nodes.
    Selection,
}

type MouseCallback = Box<dyn FnMut(&MouseEvent)>;

pub struct Network {
    id: String,
    options: NetworkOptions,
    camera: Camera,
    reconciler: GraphReconciler,
    graph: Option<Arc<Graph>>,
    interaction: InteractionState,
    input: InputState,
    key_action: Option<KeyAction>,
    layouter: Box<dyn Layouter>,
    layout_run: Option<Box<dyn LayoutRun>>,
    relayout_predicate: Option<LayoutPredicate>,
    screen: Size,
    on_mouse: Option<MouseCallback>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(NetworkOptions::default())
    }
}

impl Network {
    pub fn new(options: NetworkOptions) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            camera: Camera::from_options(&options.camera),
            options,
            reconciler: GraphReconciler::new(),
            graph: None,
            interaction: InteractionState::new(),
            input: InputState::new(),
            key_action: None,
            layouter: Box::new(ForceLayouter::new()),
            layout_run: None,
            relayout_predicate: None,
            screen: Size::new(800.0, 600.0),
            on_mouse: None,
        }
    }

    /// Use a host-chosen identifier instead of a random one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_layouter(mut self, layouter: Box<dyn Layouter>) -> Self {
        self.layouter = layouter;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &NetworkOptions {
        &self.options
    }

    pub fn nodes(&self) -> &NodeTable {
        self.reconciler.nodes()
    }

    pub fn edges(&self) -> &EdgeTable {
        self.reconciler.edges()
    }

    pub fn shapes(&self) -> &[Shape] {
        self.reconciler.shapes()
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn hover(&self) -> &HoverState {
        self.interaction.hover()
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    pub fn key_action(&self) -> Option<KeyAction> {
        self.key_action
    }

    pub fn is_layout_running(&self) -> bool {
        self.layout_run.is_some()
    }

    /// Register the host callback for semantic mouse events.
    pub fn on_mouse(&mut self, callback: impl FnMut(&MouseEvent) + 'static) {
        self.on_mouse = Some(Box::new(callback));
    }

    /// Predicate that may force relayout on passes without structural change.
    pub fn set_relayout_predicate(&mut self, predicate: Option<LayoutPredicate>) {
        self.relayout_predicate = predicate;
    }

    /// Snapshot of the camera.
    pub fn camera(&self) -> CameraState {
        self.camera.state()
    }

    /// World position of every node, in draw order.
    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes()
            .iter()
            .map(|(_, node)| NodePosition {
                id: node.id().to_string(),
                position: node.position,
            })
            .collect()
    }

    /// The curve an edge is drawn and hit-tested with.
    pub fn edge_curve(&self, key: EdgeKey) -> Option<EdgeCurve> {
        let edge = self.edges().get(key)?;
        edge_curve(edge, self.nodes(), self.options.edges.duplicate_spacing)
    }

    /// Bounds of all nodes and shapes.
    pub fn bounds(&self) -> Option<Rect> {
        bounds_of(self.nodes(), self.shapes())
    }

    /// Declare the graph to show.
    ///
    /// Handing back the same `Arc` with unchanged shapes is a no-op.
    pub fn set_graph(
        &mut self,
        graph: Arc<Graph>,
        shapes: Vec<Shape>,
    ) -> GraphResult<ReconcileOutcome> {
        let unchanged = self.graph.as_ref().is_some_and(|current| Arc::ptr_eq(current, &graph))
            && self.reconciler.shapes() == shapes.as_slice();
        if unchanged {
            return Ok(ReconcileOutcome::default());
        }

        let outcome = self.reconciler.reconcile(
            &graph,
            shapes,
            self.options.nodes.default_size,
            self.relayout_predicate.as_ref(),
        )?;
        self.graph = Some(graph);
        self.interaction.retain_existing(
            self.reconciler.nodes(),
            self.reconciler.edges(),
            self.reconciler.shapes(),
        );
        if outcome.relayout {
            self.run_layout();
        }
        Ok(outcome)
    }

    /// Deep-merge `overrides` into the current options.
    pub fn set_options(&mut self, overrides: &Value) -> Result<(), OptionsError> {
        let merged = self.options.merge(overrides)?;
        let relayout = merged.layout_options != self.options.layout_options;
        self.options = merged;
        self.camera
            .set_limits(self.options.camera.min_scale, self.options.camera.max_scale);
        if relayout {
            self.run_layout();
        }
        Ok(())
    }

    /// Swap the layouter and lay the current graph out with it.
    pub fn set_layouter(&mut self, layouter: Box<dyn Layouter>) {
        self.layouter = layouter;
        self.run_layout();
    }

    /// Update the drawing surface size.
    pub fn resize(&mut self, screen: Size) {
        if !(screen.width > 0.0 && screen.height > 0.0) {
            log::warn!("Ignoring invalid screen size {screen:?}");
            return;
        }
        self.screen = screen;
    }

    /// Start a new layout run, stopping the current one first.
    pub fn run_layout(&mut self) {
        if let Some(mut run) = self.layout_run.take() {
            run.stop();
        }
        let context = LayoutContext {
            nodes: self.reconciler.nodes(),
            edges: self.reconciler.edges(),
            shapes: self.reconciler.shapes(),
            options: &self.options.layout_options,
            screen: self.screen,
        };
        match self.layouter.start(context) {
            Ok(run) => self.layout_run = Some(run),
            Err(err) => log::error!("Layout failed to start: {err}"),
        }
    }

    fn scene(&self) -> SceneView<'_> {
        SceneView {
            nodes: self.reconciler.nodes(),
            edges: self.reconciler.edges(),
            shapes: self.reconciler.shapes(),
            camera: &self.camera,
            options: &self.options,
            screen: self.screen,
        }
    }

    /// Feed a pointer event. Returns whether the event was consumed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.input.handle_pointer_event(&event);
        let movement = match event {
            PointerEvent::Move { .. } => self.input.pointer_delta(),
            _ => kurbo::Vec2::ZERO,
        };

        let state = std::mem::take(&mut self.interaction);
        let Transition { state, effects } = state.on_pointer(&self.scene(), &event, movement);
        self.interaction = state;

        let consumed = !effects.is_empty() || matches!(event, PointerEvent::Wheel { .. });
        self.apply(effects, Some(InputEvent::Pointer(event)));
        consumed
    }

    /// Feed a key event. Actions are applied once per tick while held.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        match &event {
            KeyEvent::Pressed(key) => {
                self.key_action = KeyAction::from_key(key);
                if self.key_action.is_none() {
                    log::debug!("No action bound to key {key:?}");
                }
            }
            KeyEvent::Released(_) => self.key_action = None,
        }
        self.key_action.is_some()
    }

    /// Advance time-based state by `dt`. Returns whether anything changed.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let mut changed = false;

        if let Some(action) = self.key_action {
            self.camera
                .apply_key_action(action, self.screen, &self.options.camera, dt);
            changed = true;
        }

        if self.camera.is_animating() {
            self.camera.advance_animation(dt, self.options.camera.animation_rate);
            changed = true;
        }

        if let Some(shift) = self.camera.advance_edge_pan(dt) {
            let dragged = self.interaction.dragged_nodes().to_vec();
            let nodes = self.reconciler.nodes_mut();
            for key in dragged {
                if let Some(node) = nodes.get_mut(key) {
                    node.position += shift;
                }
            }
            changed = true;
        }

        let state = std::mem::take(&mut self.interaction);
        let Transition { state, effects } = state.advance_hover(dt);
        self.interaction = state;
        changed |= !effects.is_empty();
        self.apply(effects, None);

        if let Some(run) = self.layout_run.as_mut() {
            let (nodes, edges, _) = self.reconciler.tables_mut();
            let progress = run.step(nodes, edges, dt);
            changed = true;
            if progress.finished {
                self.layout_run = None;
            }
            if progress.request_fit {
                self.fit();
            }
        }

        changed
    }

    /// Animate the camera to show everything.
    pub fn fit(&mut self) {
        let bounds = self.bounds();
        self.camera
            .fit_to_bounds(bounds, self.screen, self.options.camera.fit_all_padding);
    }

    /// Apply a zoom control. Returns whether the camera got a new target.
    pub fn zoom(&mut self, level: ZoomLevel) -> bool {
        let camera = &self.options.camera;
        match level {
            ZoomLevel::In => self.camera.zoom_in(self.screen, camera.zoom_step),
            ZoomLevel::Out => {
                let bounds = bounds_of(self.reconciler.nodes(), self.reconciler.shapes());
                self.camera
                    .zoom_out(self.screen, bounds, camera.zoom_step, camera.fit_all_padding);
            }
            ZoomLevel::All => self.fit(),
            ZoomLevel::Selection => return self.zoom_to_selection(),
        }
        true
    }

    /// One selected node is centred at the current zoom; several are fitted.
    fn zoom_to_selection(&mut self) -> bool {
        let nodes = self.reconciler.nodes();
        let selected: Vec<_> = self
            .interaction
            .selection()
            .iter()
            .filter_map(|&key| nodes.get(key))
            .collect();
        match selected.as_slice() {
            [] => false,
            [node] => {
                let scale = self.camera.state().destination_scale.unwrap_or(self.camera.scale);
                let centre = Point::new(self.screen.width / 2.0, self.screen.height / 2.0);
                let pan = centre.to_vec2() - node.position.to_vec2() * scale;
                self.camera.zoom_to_destination(pan, scale);
                true
            }
            several => {
                let bounds = several.iter().map(|node| node.bounds()).reduce(|a, b| a.union(b));
                self.camera
                    .fit_to_bounds(bounds, self.screen, self.options.camera.fit_all_padding);
                true
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>, raw: Option<InputEvent>) {
        for effect in effects {
            match effect {
                Effect::PanCamera(delta) => self.camera.pan_by(delta),
                Effect::WheelZoom { position, delta_y } => {
                    self.camera
                        .zoom_from_wheel(position, delta_y, self.options.camera.wheel_sensitivity);
                }
                Effect::AnimateCamera { pan, scale } => self.camera.zoom_to_destination(pan, scale),
                Effect::MoveNodes { nodes, delta } => {
                    let table = self.reconciler.nodes_mut();
                    for key in nodes {
                        if let Some(node) = table.get_mut(key) {
                            node.position += delta;
                            node.pin();
                        }
                    }
                }
                Effect::SetEdgePan(pan) => self.camera.set_edge_pan(pan),
                Effect::BringShapeToFront(id) => {
                    bring_to_front(self.reconciler.shapes_mut(), &id);
                }
                Effect::SetShapeRect { id, rect } => {
                    let shapes = self.reconciler.shapes_mut();
                    if let Some(shape) = shapes.iter_mut().find(|s| s.id == id) {
                        shape.set_rect(rect);
                    }
                }
                Effect::Emit(mut event) => {
                    event.raw = raw.clone();
                    log::debug!("Emitting {:?}", event.kind);
                    if let Some(callback) = self.on_mouse.as_mut() {
                        callback(&event);
                    }
                }
            }
        }
    }
}
