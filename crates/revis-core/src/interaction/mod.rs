//! Pointer interaction state machine.
//!
//! Transitions are pure: they consume the current [`InteractionState`],
//! read the scene through a [`SceneView`] and return the next state together
//! with the [`Effect`]s the network must apply, in order.

mod hover;
mod state;

pub use hover::{HoverItem, HoverPopup, HoverState, popup_position};
pub use state::{Action, InteractionState};

use crate::camera::Camera;
use crate::geometry::{edge_at, node_at};
use crate::graph::{EdgeKey, EdgeTable, NodeKey, NodeTable};
use crate::input::InputEvent;
use crate::options::NetworkOptions;
use crate::shape::Shape;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Semantic event reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventKind {
    NodeClick,
    EdgeClick,
    BackgroundClick,
    NodesDragged,
    ShapeClick,
    ShapeUpdate,
    NodeDblClick,
    EdgeDblClick,
    HoverShow,
    HoverHide,
}

/// A node id with its world position at the time of the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub position: Point,
}

/// Items an event refers to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MousePayload {
    #[default]
    None,
    Node(NodePosition),
    Edge { id: String },
    Nodes { nodes: Vec<NodePosition> },
    Shape { shape: Shape },
    Shapes { shapes: Vec<Shape> },
    Hover { item: HoverItem, position: Point },
}

/// Host callback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub payload: MousePayload,
    /// The raw input that caused the event. `None` for time-driven events.
    pub raw: Option<InputEvent>,
}

impl MouseEvent {
    pub fn new(kind: MouseEventKind, payload: MousePayload) -> Self {
        Self {
            kind,
            payload,
            raw: None,
        }
    }
}

/// A change the network applies on behalf of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Pan the camera by a screen delta.
    PanCamera(Vec2),
    /// Immediate wheel zoom around a screen point.
    WheelZoom { position: Point, delta_y: f64 },
    /// Animated camera transition.
    AnimateCamera { pan: Vec2, scale: f64 },
    /// Move nodes by a world delta and pin them.
    MoveNodes { nodes: Vec<NodeKey>, delta: Vec2 },
    SetEdgePan(Option<Vec2>),
    BringShapeToFront(String),
    SetShapeRect { id: String, rect: Rect },
    Emit(MouseEvent),
}

/// Result of a transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: InteractionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: InteractionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn emit(self, event: Option<MouseEvent>) -> Self {
        match event {
            Some(event) => self.with(Effect::Emit(event)),
            None => self,
        }
    }
}

/// Read-only view of everything a transition may inspect.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    pub nodes: &'a NodeTable,
    pub edges: &'a EdgeTable,
    pub shapes: &'a [Shape],
    pub camera: &'a Camera,
    pub options: &'a NetworkOptions,
    pub screen: Size,
}

impl SceneView<'_> {
    pub fn to_world(&self, screen_point: Point) -> Point {
        self.camera.screen_to_world(screen_point)
    }

    /// Topmost node under a screen point.
    pub fn node_at(&self, screen_point: Point) -> Option<NodeKey> {
        node_at(self.nodes, self.to_world(screen_point))
    }

    /// Closest edge within the hit tolerance of a screen point.
    pub fn edge_at(&self, screen_point: Point) -> Option<EdgeKey> {
        let tolerance = self.options.edges.hit_tolerance / self.camera.scale;
        edge_at(
            self.edges,
            self.nodes,
            self.to_world(screen_point),
            tolerance,
            self.options.edges.duplicate_spacing,
        )
    }

    fn node_position(&self, key: NodeKey) -> Option<NodePosition> {
        self.nodes.get(key).map(|node| NodePosition {
            id: node.id().to_string(),
            position: node.position,
        })
    }

    fn edge_id(&self, key: EdgeKey) -> Option<String> {
        self.edges.get(key).map(|edge| edge.id().to_string())
    }
}
