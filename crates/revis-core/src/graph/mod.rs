//! Declarative graph definitions and their live visual counterparts.
//!
//! Hosts describe the desired graph with [`NodeDef`] / [`EdgeDef`] values
//! wrapped in `Arc`. The reconciler keeps one [`VisualNode`] / [`VisualEdge`]
//! per id and compares definitions by pointer, so handing the same `Arc`
//! back is free and a fresh `Arc` means "this definition changed".

mod edge;
mod node;
mod table;

pub use edge::{EdgeDef, EdgeKey, VisualEdge};
pub use node::{NodeDef, NodeKey, NodeShape, VisualNode};
pub use table::{EdgeTable, EntityTable, NodeTable};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A declarative graph: the desired state to reconcile against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Arc<NodeDef>>,
    #[serde(default)]
    pub edges: Vec<Arc<EdgeDef>>,
}

impl Graph {
    /// Create a graph from owned definitions.
    pub fn new(
        nodes: impl IntoIterator<Item = NodeDef>,
        edges: impl IntoIterator<Item = EdgeDef>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
            edges: edges.into_iter().map(Arc::new).collect(),
        }
    }
}
