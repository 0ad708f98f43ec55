//! Scripted replay of input against a network.
//!
//! A scene file declares the graph, overlay shapes, option overrides and the
//! surface size. A script is a list of steps (pointer and key events, frame
//! ticks, zoom controls, option and graph updates) fed to the network in
//! order. The result is everything a host would observe: the callbacks it
//! received, the final node positions and the camera.
//!
//! ## Script format
//!
//! ```json
//! { "steps": [
//!     { "step": "pointer", "event": { "type": "down", "position": { "x": 10.0, "y": 20.0 } } },
//!     { "step": "tick", "ms": 16, "frames": 30 },
//!     { "step": "zoom", "level": "all" }
//! ] }
//! ```

use kurbo::Size;
use revis_core::{
    CameraState, Graph, GraphError, KeyEvent, MouseEvent, Network, NetworkOptions, NodePosition,
    OptionsError, PointerEvent, Shape, ZoomLevel,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("Options error: {0}")]
    Options(#[from] OptionsError),
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// The initial state of a replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(flatten)]
    pub graph: Graph,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    /// Option overrides merged over the defaults.
    #[serde(default)]
    pub options: Value,
    /// Drawing surface size. The network default is used when absent.
    #[serde(default)]
    pub screen: Option<Size>,
}

impl Scene {
    pub fn from_file(path: impl AsRef<Path>) -> ReplayResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn one_frame() -> u32 {
    1
}

/// One script step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Pointer {
        event: PointerEvent,
    },
    Key {
        event: KeyEvent,
    },
    /// Advance `frames` frames of `ms` milliseconds each.
    Tick {
        ms: u64,
        #[serde(default = "one_frame")]
        frames: u32,
    },
    Resize {
        width: f64,
        height: f64,
    },
    Zoom {
        level: ZoomLevel,
    },
    Fit,
    Options {
        options: Value,
    },
    /// Replace the declared graph.
    Graph {
        graph: Graph,
        #[serde(default)]
        shapes: Vec<Shape>,
    },
}

/// A sequence of steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_file(path: impl AsRef<Path>) -> ReplayResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// What the host observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub events: Vec<MouseEvent>,
    pub positions: Vec<NodePosition>,
    pub camera: CameraState,
    /// Edges still waiting for an endpoint after the last graph update.
    pub deferred_edges: Vec<String>,
}

/// Feed `script` to a fresh network built from `scene`.
pub fn replay(scene: Scene, script: &Script) -> ReplayResult<Report> {
    let options = NetworkOptions::merged(&scene.options)?;
    let mut network = Network::new(options);
    if let Some(screen) = scene.screen {
        network.resize(screen);
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    network.on_mouse(move |event| sink.borrow_mut().push(event.clone()));

    let mut deferred_edges = network.set_graph(Arc::new(scene.graph), scene.shapes)?.deferred_edges;

    for (index, step) in script.steps.iter().enumerate() {
        log::debug!("Step {index}: {step:?}");
        match step {
            Step::Pointer { event } => {
                network.handle_pointer(event.clone());
            }
            Step::Key { event } => {
                network.handle_key(event.clone());
            }
            Step::Tick { ms, frames } => {
                let dt = Duration::from_millis(*ms);
                for _ in 0..*frames {
                    network.tick(dt);
                }
            }
            Step::Resize { width, height } => network.resize(Size::new(*width, *height)),
            Step::Zoom { level } => {
                if !network.zoom(*level) {
                    log::info!("Zoom {level:?} had nothing to show");
                }
            }
            Step::Fit => network.fit(),
            Step::Options { options } => network.set_options(options)?,
            Step::Graph { graph, shapes } => {
                let outcome = network.set_graph(Arc::new(graph.clone()), shapes.clone())?;
                deferred_edges = outcome.deferred_edges;
            }
        }
    }

    let events = events.take();
    log::info!("Replayed {} steps, {} events", script.steps.len(), events.len());
    Ok(Report {
        events,
        positions: network.positions(),
        camera: network.camera(),
        deferred_edges,
    })
}

/// Load a scene and a script from disk and replay them.
pub fn replay_files(scene: impl AsRef<Path>, script: impl AsRef<Path>) -> ReplayResult<Report> {
    let scene = Scene::from_file(scene)?;
    let script = Script::from_file(script)?;
    replay(scene, &script)
}
