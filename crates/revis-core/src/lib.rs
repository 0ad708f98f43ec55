//! Revis Core Library
//!
//! Platform-agnostic interaction and reconciliation engine for interactive
//! network graphs. Drawing is left to the host: it reads node positions,
//! edge curves, shapes and the camera after every event and tick.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod network;
pub mod options;
pub mod reconcile;
pub mod shape;

pub use camera::{Camera, CameraState, KeyAction};
pub use error::{GraphError, GraphResult, LayoutError, OptionsError};
pub use geometry::{EdgeCurve, bounds_of};
pub use graph::{
    EdgeDef, EdgeKey, EdgeTable, Graph, NodeDef, NodeKey, NodeShape, NodeTable, VisualEdge,
    VisualNode,
};
pub use input::{InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{
    Action, HoverItem, HoverState, InteractionState, MouseEvent, MouseEventKind, MousePayload,
    NodePosition,
};
pub use layout::{ForceLayouter, LayoutContext, LayoutProgress, LayoutRun, Layouter};
pub use network::{Network, ZoomLevel};
pub use options::NetworkOptions;
pub use reconcile::{GraphReconciler, GraphSnapshot, LayoutPredicate, ReconcileOutcome};
pub use shape::{Handle, HandleKind, Shape};
