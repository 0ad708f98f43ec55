//! Layout collaborators.
//!
//! The network owns one [`Layouter`] and starts a [`LayoutRun`] whenever a
//! reconciliation pass asks for relayout. Runs are stepped from the frame
//! tick and only ever touch node positions.

use crate::camera::reference_frames;
use crate::error::LayoutError;
use crate::graph::{EdgeTable, NodeKey, NodeTable};
use crate::shape::Shape;
use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Everything a layouter may read when a run starts.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub nodes: &'a NodeTable,
    pub edges: &'a EdgeTable,
    pub shapes: &'a [Shape],
    /// Opaque `layout_options` from the network options.
    pub options: &'a Value,
    pub screen: Size,
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutProgress {
    /// The layout settled and the camera should fit the result.
    pub request_fit: bool,
    /// The run is done and can be dropped.
    pub finished: bool,
}

impl LayoutProgress {
    pub fn running() -> Self {
        Self::default()
    }

    pub fn settled(request_fit: bool) -> Self {
        Self {
            request_fit,
            finished: true,
        }
    }
}

/// Starts layout runs.
pub trait Layouter {
    fn start(&mut self, context: LayoutContext<'_>) -> Result<Box<dyn LayoutRun>, LayoutError>;
}

/// An in-flight layout, stepped once per frame.
pub trait LayoutRun {
    fn step(&mut self, nodes: &mut NodeTable, edges: &EdgeTable, dt: Duration) -> LayoutProgress;

    /// Called when a newer run replaces this one.
    fn stop(&mut self) {}
}

/// Tunables of [`ForceLayouter`], read from `layout_options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceSettings {
    pub repulsion: f64,
    pub softening: f64,
    /// Rest length of edge springs, in world units.
    pub spring_length: f64,
    pub spring_strength: f64,
    pub center_pull: f64,
    /// Velocity retained per reference frame.
    pub damping: f64,
    pub max_speed: f64,
    pub max_iterations: usize,
    /// The run settles once every node is slower than this.
    pub settle_speed: f64,
    pub fit_on_finish: bool,
}

impl Default for ForceSettings {
    fn default() -> Self {
        Self {
            repulsion: 8000.0,
            softening: 100.0,
            spring_length: 80.0,
            spring_strength: 0.02,
            center_pull: 0.002,
            damping: 0.85,
            max_speed: 30.0,
            max_iterations: 400,
            settle_speed: 0.05,
            fit_on_finish: true,
        }
    }
}

/// Default layouter: node repulsion, edge springs and a weak pull towards
/// the origin. Fixed nodes exert forces but never move.
#[derive(Debug, Clone, Default)]
pub struct ForceLayouter;

impl ForceLayouter {
    pub fn new() -> Self {
        Self
    }
}

impl Layouter for ForceLayouter {
    fn start(&mut self, context: LayoutContext<'_>) -> Result<Box<dyn LayoutRun>, LayoutError> {
        let settings = if context.options.is_null() {
            ForceSettings::default()
        } else {
            serde_json::from_value(context.options.clone())
                .map_err(|err| LayoutError::Failed(format!("Invalid layout options: {err}")))?
        };
        log::debug!("Starting force layout over {} nodes", context.nodes.len());
        Ok(Box::new(ForceRun {
            settings,
            velocities: HashMap::new(),
            iterations: 0,
        }))
    }
}

struct ForceRun {
    settings: ForceSettings,
    velocities: HashMap<NodeKey, Vec2>,
    iterations: usize,
}

/// Repulsion exerted on `a` by `b`. Coincident points push apart along a
/// direction derived from their indices.
fn repulsion_between(delta: Vec2, strength: f64, softening: f64, i: usize, j: usize) -> Vec2 {
    let distance_sq = delta.hypot2();
    let distance = distance_sq.sqrt();
    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        let angle = (i as f64 * 0.618_034 + j as f64 * 0.414_214) * std::f64::consts::TAU;
        Vec2::new(angle.cos(), angle.sin())
    };
    direction * (strength / (distance_sq + softening))
}

impl ForceRun {
    /// Move nodes still at their initial placement next to a placed
    /// neighbour, spreading siblings around it. Repeats so chains of
    /// unplaced nodes grow outwards from the placed part of the graph.
    fn seed(&self, nodes: &mut NodeTable, edges: &EdgeTable) {
        let mut index = 0usize;
        loop {
            let mut seeded = false;
            for (_, edge) in edges.iter() {
                let (Some(from), Some(to)) = (nodes.get(edge.from()), nodes.get(edge.to())) else {
                    continue;
                };
                let (anchor, key) = match (from.placed, to.placed) {
                    (true, false) => (from.position, edge.to()),
                    (false, true) => (to.position, edge.from()),
                    _ => continue,
                };
                let angle = index as f64 * 0.618_034 * std::f64::consts::TAU;
                index += 1;
                if let Some(node) = nodes.get_mut(key) {
                    let offset = Vec2::new(angle.cos(), angle.sin()) * self.settings.spring_length;
                    node.position = anchor + offset;
                    node.placed = true;
                    seeded = true;
                }
            }
            if !seeded {
                break;
            }
        }
        if index > 0 {
            log::debug!("Seeded {index} nodes next to placed neighbours");
        }
    }

    fn forces(
        &self,
        nodes: &NodeTable,
        edges: &EdgeTable,
        keys: &[NodeKey],
    ) -> HashMap<NodeKey, Vec2> {
        let settings = &self.settings;
        let positions: Vec<Vec2> = keys
            .iter()
            .map(|&key| nodes.get(key).map(|node| node.position.to_vec2()).unwrap_or_default())
            .collect();
        let mut forces = vec![Vec2::ZERO; keys.len()];

        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                let delta = positions[i] - positions[j];
                let push = repulsion_between(delta, settings.repulsion, settings.softening, i, j);
                forces[i] += push;
                forces[j] -= push;
            }
            forces[i] -= positions[i] * settings.center_pull;
        }

        let index: HashMap<NodeKey, usize> =
            keys.iter().enumerate().map(|(i, &key)| (key, i)).collect();
        for (_, edge) in edges.iter() {
            if edge.is_self_loop() {
                continue;
            }
            let (Some(&from), Some(&to)) = (index.get(&edge.from()), index.get(&edge.to())) else {
                continue;
            };
            let delta = positions[from] - positions[to];
            let distance = delta.hypot();
            if distance < 1e-4 {
                continue;
            }
            let stretch = (distance - settings.spring_length) * settings.spring_strength;
            let correction = delta / distance * stretch;
            forces[from] -= correction;
            forces[to] += correction;
        }

        keys.iter().copied().zip(forces).collect()
    }
}

impl LayoutRun for ForceRun {
    fn step(&mut self, nodes: &mut NodeTable, edges: &EdgeTable, dt: Duration) -> LayoutProgress {
        let keys: Vec<NodeKey> = nodes.iter().map(|(key, _)| key).collect();
        if keys.is_empty() {
            return LayoutProgress::settled(false);
        }
        if self.iterations == 0 {
            self.seed(nodes, edges);
        }

        let forces = self.forces(nodes, edges, &keys);
        let time_scale = reference_frames(dt).clamp(0.25, 3.0);
        let damping = self.settings.damping.clamp(0.0, 1.0).powf(time_scale);
        let mut fastest: f64 = 0.0;

        for (key, force) in forces {
            let Some(node) = nodes.get_mut(key) else {
                continue;
            };
            if node.fixed {
                self.velocities.remove(&key);
                continue;
            }
            let previous = self.velocities.get(&key).copied().unwrap_or(Vec2::ZERO);
            let mut velocity = (previous + force * time_scale) * damping;
            let speed = velocity.hypot();
            if speed > self.settings.max_speed {
                velocity *= self.settings.max_speed / speed;
            }
            if !velocity.x.is_finite() || !velocity.y.is_finite() {
                velocity = Vec2::ZERO;
            }
            node.position += velocity * time_scale;
            node.placed = true;
            fastest = fastest.max(velocity.hypot());
            self.velocities.insert(key, velocity);
        }

        self.iterations += 1;
        if fastest < self.settings.settle_speed || self.iterations >= self.settings.max_iterations {
            log::debug!("Force layout settled after {} iterations", self.iterations);
            return LayoutProgress::settled(self.settings.fit_on_finish);
        }
        LayoutProgress::running()
    }

    fn stop(&mut self) {
        log::debug!("Force layout stopped after {} iterations", self.iterations);
        self.velocities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeDef, Graph, NodeDef};
    use crate::reconcile::GraphReconciler;
    use kurbo::Point;
    use serde_json::json;

    const FRAME: Duration = Duration::from_millis(16);

    fn reconciler(graph: &Graph) -> GraphReconciler {
        let mut reconciler = GraphReconciler::new();
        reconciler.reconcile(graph, Vec::new(), 10.0, None).unwrap();
        reconciler
    }

    fn start(
        reconciler: &GraphReconciler,
        options: &Value,
    ) -> Result<Box<dyn LayoutRun>, LayoutError> {
        ForceLayouter::new().start(LayoutContext {
            nodes: reconciler.nodes(),
            edges: reconciler.edges(),
            shapes: reconciler.shapes(),
            options,
            screen: Size::new(800.0, 600.0),
        })
    }

    fn run_to_end(
        run: &mut dyn LayoutRun,
        reconciler: &mut GraphReconciler,
    ) -> (usize, LayoutProgress) {
        for i in 1..=1000 {
            let (nodes, edges, _) = reconciler.tables_mut();
            let progress = run.step(nodes, edges, FRAME);
            if progress.finished {
                return (i, progress);
            }
        }
        panic!("Layout never finished");
    }

    fn distance(reconciler: &GraphReconciler, a: &str, b: &str) -> f64 {
        let a = reconciler.nodes().by_id(a).unwrap().position;
        let b = reconciler.nodes().by_id(b).unwrap().position;
        (a - b).hypot()
    }

    #[test]
    fn test_unconnected_nodes_repel() {
        let graph = Graph::new(
            [NodeDef::new("a").at(0.0, 0.0), NodeDef::new("b").at(5.0, 0.0)],
            Vec::<EdgeDef>::new(),
        );
        let mut reconciler = reconciler(&graph);
        let mut run = start(&reconciler, &Value::Null).unwrap();
        for _ in 0..10 {
            let (nodes, edges, _) = reconciler.tables_mut();
            run.step(nodes, edges, FRAME);
        }
        assert!(distance(&reconciler, "a", "b") > 5.0);
    }

    #[test]
    fn test_spring_pulls_towards_rest_length() {
        let graph = Graph::new(
            [NodeDef::new("a").at(-500.0, 0.0), NodeDef::new("b").at(500.0, 0.0)],
            [EdgeDef::new("e", "a", "b")],
        );
        let mut reconciler = reconciler(&graph);
        let mut run = start(&reconciler, &Value::Null).unwrap();
        run_to_end(run.as_mut(), &mut reconciler);
        assert!(distance(&reconciler, "a", "b") < 500.0);
    }

    #[test]
    fn test_fixed_nodes_do_not_move() {
        let mut pinned = NodeDef::new("pinned").at(3.0, 4.0);
        pinned.fixed = true;
        let graph = Graph::new(
            [pinned, NodeDef::new("free").at(5.0, 4.0)],
            [EdgeDef::new("e", "pinned", "free")],
        );
        let mut reconciler = reconciler(&graph);
        let mut run = start(&reconciler, &Value::Null).unwrap();
        run_to_end(run.as_mut(), &mut reconciler);
        assert_eq!(reconciler.nodes().by_id("pinned").unwrap().position, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_unplaced_node_starts_next_to_placed_neighbour() {
        let graph = Graph::new(
            [NodeDef::new("a").at(1000.0, 1000.0), NodeDef::new("b"), NodeDef::new("c")],
            [EdgeDef::new("ab", "a", "b"), EdgeDef::new("bc", "b", "c")],
        );
        let mut reconciler = reconciler(&graph);
        assert!(!reconciler.nodes().by_id("b").unwrap().placed);
        assert!(distance(&reconciler, "a", "b") > 1000.0);

        let mut run = start(&reconciler, &Value::Null).unwrap();
        let (nodes, edges, _) = reconciler.tables_mut();
        run.step(nodes, edges, FRAME);
        assert!(distance(&reconciler, "a", "b") < 200.0);
        assert!(distance(&reconciler, "b", "c") < 200.0);
    }

    #[test]
    fn test_finishes_and_requests_fit() {
        let graph = Graph::new(
            [NodeDef::new("a"), NodeDef::new("b"), NodeDef::new("c")],
            Vec::<EdgeDef>::new(),
        );
        let mut reconciler = reconciler(&graph);
        let mut run = start(&reconciler, &json!({ "max_iterations": 20 })).unwrap();
        let (steps, progress) = run_to_end(run.as_mut(), &mut reconciler);
        assert!(steps <= 20);
        assert!(progress.request_fit);
        assert!(reconciler.nodes().iter().all(|(_, node)| node.placed));
    }

    #[test]
    fn test_empty_graph_settles_without_fit() {
        let mut reconciler = reconciler(&Graph::default());
        let mut run = start(&reconciler, &Value::Null).unwrap();
        let (nodes, edges, _) = reconciler.tables_mut();
        assert_eq!(run.step(nodes, edges, FRAME), LayoutProgress::settled(false));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let reconciler = reconciler(&Graph::default());
        let result = start(&reconciler, &json!({ "max_iterations": "many" }));
        assert!(matches!(result, Err(LayoutError::Failed(_))));
    }
}
