//! Edge definitions and visual edges.

use super::node::NodeKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::new_key_type;
use std::sync::Arc;

new_key_type! {
    /// Arena key of a [`VisualEdge`].
    pub struct EdgeKey;
}

/// Declarative edge definition supplied by the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeDef {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Opaque host data.
    #[serde(default)]
    pub data: Value,
}

impl EdgeDef {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            ..Self::default()
        }
    }

    /// Key identifying the unordered endpoint pair.
    pub fn pair_key(&self) -> (&str, &str) {
        if self.from <= self.to {
            (self.from.as_str(), self.to.as_str())
        } else {
            (self.to.as_str(), self.from.as_str())
        }
    }
}

/// Live edge state. Endpoints are arena keys into the node table; the edge
/// never owns its nodes.
#[derive(Debug, Clone)]
pub struct VisualEdge {
    id: String,
    definition: Arc<EdgeDef>,
    pub(crate) from: NodeKey,
    pub(crate) to: NodeKey,
    /// Ordinal among edges joining the same unordered pair, in declaration
    /// order. Zero is drawn straight; others are offset.
    pub(crate) duplicate_index: usize,
}

impl VisualEdge {
    pub(crate) fn new(
        definition: Arc<EdgeDef>,
        from: NodeKey,
        to: NodeKey,
        duplicate_index: usize,
    ) -> Self {
        Self {
            id: definition.id.clone(),
            definition,
            from,
            to,
            duplicate_index,
        }
    }

    pub(crate) fn update(&mut self, definition: Arc<EdgeDef>, from: NodeKey, to: NodeKey) {
        self.definition = definition;
        self.from = from;
        self.to = to;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &Arc<EdgeDef> {
        &self.definition
    }

    pub fn from(&self) -> NodeKey {
        self.from
    }

    pub fn to(&self) -> NodeKey {
        self.to
    }

    pub fn duplicate_index(&self) -> usize {
        self.duplicate_index
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}
