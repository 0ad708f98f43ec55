//! Reconciliation of the declarative graph into visual entities.
//!
//! A pass walks the declared nodes and edges, creates entities for new ids,
//! updates entities whose definition `Arc` changed, and removes entities
//! whose id is gone. Entities that survive keep their identity (arena key)
//! and their computed position.
//!
//! Edges whose endpoints are not (or no longer) present are deferred: they
//! are not constructed, are reported in [`ReconcileOutcome::deferred_edges`],
//! and get constructed by the first pass in which both endpoints exist.

use crate::error::{GraphError, GraphResult};
use crate::graph::{EdgeDef, EdgeTable, Graph, NodeDef, NodeTable, VisualEdge, VisualNode};
use crate::shape::Shape;
use kurbo::Point;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Distance scale of the initial spiral placement.
const PLACEMENT_SPACING: f64 = 30.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Declarative state compared by the relayout predicate.
#[derive(Debug, Clone, Copy)]
pub struct GraphSnapshot<'a> {
    pub nodes: &'a [Arc<NodeDef>],
    pub edges: &'a [Arc<EdgeDef>],
    pub shapes: &'a [Shape],
}

/// Host predicate deciding whether a pass should relayout even without
/// structural change. Called with `(previous, next)`.
pub type LayoutPredicate = Box<dyn Fn(&GraphSnapshot<'_>, &GraphSnapshot<'_>) -> bool>;

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Whether any node or edge was created or deleted.
    pub changed: bool,
    /// Whether the layouter should run.
    pub relayout: bool,
    /// Declared edges not constructed because an endpoint is missing.
    pub deferred_edges: Vec<String>,
}

/// Owns the visual entity tables and keeps them in sync with the
/// declarative graph.
#[derive(Debug, Default)]
pub struct GraphReconciler {
    nodes: NodeTable,
    edges: EdgeTable,
    shapes: Vec<Shape>,
    declared: Graph,
    placements: usize,
}

impl GraphReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeTable {
        &mut self.nodes
    }

    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut Vec<Shape> {
        &mut self.shapes
    }

    /// Tables split for simultaneous access (layouter steps).
    pub fn tables_mut(&mut self) -> (&mut NodeTable, &EdgeTable, &[Shape]) {
        (&mut self.nodes, &self.edges, &self.shapes)
    }

    /// The last reconciled declarative state.
    pub fn snapshot(&self) -> GraphSnapshot<'_> {
        GraphSnapshot {
            nodes: &self.declared.nodes,
            edges: &self.declared.edges,
            shapes: &self.shapes,
        }
    }

    /// Run a reconciliation pass.
    ///
    /// Duplicate ids in `graph` are rejected before anything is touched.
    pub fn reconcile(
        &mut self,
        graph: &Graph,
        shapes: Vec<Shape>,
        default_size: f64,
        predicate: Option<&LayoutPredicate>,
    ) -> GraphResult<ReconcileOutcome> {
        validate(graph)?;

        let forced = predicate.is_some_and(|predicate| {
            let next = GraphSnapshot {
                nodes: &graph.nodes,
                edges: &graph.edges,
                shapes: &shapes,
            };
            predicate(&self.snapshot(), &next)
        });

        let nodes_changed = self.reconcile_nodes(&graph.nodes, default_size);
        let (edges_changed, deferred_edges) = self.reconcile_edges(&graph.edges);
        self.shapes = shapes;
        self.declared = graph.clone();

        if !deferred_edges.is_empty() {
            log::warn!(
                "Deferred {} edge(s) with missing endpoints: {:?}",
                deferred_edges.len(),
                deferred_edges
            );
        }
        let changed = nodes_changed || edges_changed;
        log::debug!(
            "Reconciled {} nodes, {} edges (changed: {}, forced relayout: {})",
            self.nodes.len(),
            self.edges.len(),
            changed,
            forced
        );

        Ok(ReconcileOutcome {
            changed,
            relayout: changed || forced,
            deferred_edges,
        })
    }

    fn reconcile_nodes(&mut self, declared: &[Arc<NodeDef>], default_size: f64) -> bool {
        let mut dirty = false;
        for definition in declared {
            match self.nodes.by_id_mut(&definition.id) {
                Some(node) => {
                    if !Arc::ptr_eq(node.definition(), definition) {
                        node.update(Arc::clone(definition), default_size);
                    }
                }
                None => {
                    let fallback = self.next_placement();
                    let node = VisualNode::new(Arc::clone(definition), default_size, fallback);
                    self.nodes.insert(node);
                    dirty = true;
                }
            }
        }

        // After the loop every surviving node holds a definition from the
        // declared list, so id membership equals definition identity.
        let ids: HashSet<&str> = declared.iter().map(|d| d.id.as_str()).collect();
        let removed = self.nodes.retain(|_, node| ids.contains(node.id()));
        dirty || !removed.is_empty()
    }

    fn reconcile_edges(&mut self, declared: &[Arc<EdgeDef>]) -> (bool, Vec<String>) {
        let mut dirty = false;
        let mut deferred = Vec::new();
        let mut duplicates: HashMap<(&str, &str), usize> = HashMap::new();

        for definition in declared {
            let endpoints = self
                .nodes
                .key_of(&definition.from)
                .zip(self.nodes.key_of(&definition.to));
            let Some((from, to)) = endpoints else {
                if let Some(key) = self.edges.key_of(&definition.id) {
                    self.edges.remove(key);
                    dirty = true;
                }
                deferred.push(definition.id.clone());
                continue;
            };

            let counter = duplicates.entry(definition.pair_key()).or_insert(0);
            let duplicate_index = *counter;
            *counter += 1;

            match self.edges.by_id_mut(&definition.id) {
                Some(edge) => {
                    let rewired = edge.from() != from || edge.to() != to;
                    if !Arc::ptr_eq(edge.definition(), definition) || rewired {
                        edge.update(Arc::clone(definition), from, to);
                    }
                    edge.duplicate_index = duplicate_index;
                }
                None => {
                    self.edges
                        .insert(VisualEdge::new(Arc::clone(definition), from, to, duplicate_index));
                    dirty = true;
                }
            }
        }

        let ids: HashSet<&str> = declared.iter().map(|d| d.id.as_str()).collect();
        let removed = self.edges.retain(|_, edge| ids.contains(edge.id()));
        (dirty || !removed.is_empty(), deferred)
    }

    /// Spiral position for nodes created without coordinates.
    fn next_placement(&mut self) -> Point {
        let n = self.placements as f64;
        self.placements += 1;
        let radius = PLACEMENT_SPACING * n.sqrt();
        let angle = n * GOLDEN_ANGLE;
        Point::new(radius * angle.cos(), radius * angle.sin())
    }
}

fn validate(graph: &Graph) -> GraphResult<()> {
    let mut seen = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNodeId(node.id.clone()));
        }
    }
    seen.clear();
    for edge in &graph.edges {
        if !seen.insert(edge.id.as_str()) {
            return Err(GraphError::DuplicateEdgeId(edge.id.clone()));
        }
    }
    Ok(())
}
