//! Node definitions and visual nodes.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::new_key_type;
use std::sync::Arc;

new_key_type! {
    /// Arena key of a [`VisualNode`].
    pub struct NodeKey;
}

/// Outline used to hit-test a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    #[default]
    Circle,
    /// Axis-aligned square with half-width `size`.
    Box,
    /// Square rotated 45 degrees with half-diagonal `size`.
    Diamond,
}

impl NodeShape {
    /// Whether `point` lies inside a node of this shape centred on `center`.
    pub fn contains(&self, center: Point, size: f64, point: Point) -> bool {
        let dx = (point.x - center.x).abs();
        let dy = (point.y - center.y).abs();
        match self {
            NodeShape::Circle => dx * dx + dy * dy <= size * size,
            NodeShape::Box => dx <= size && dy <= size,
            NodeShape::Diamond => dx + dy <= size,
        }
    }
}

/// Declarative node definition supplied by the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Explicit world position. Nodes without one are placed by the layouter.
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// Radius in world units.
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub shape: NodeShape,
    /// Pinned nodes are never moved by the layouter.
    #[serde(default)]
    pub fixed: bool,
    /// Opaque host data.
    #[serde(default)]
    pub data: Value,
}

impl NodeDef {
    /// Create a definition with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set an explicit position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the radius.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the outline shape.
    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    fn position(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Live node state, owned by the reconciler's node table.
#[derive(Debug, Clone)]
pub struct VisualNode {
    id: String,
    definition: Arc<NodeDef>,
    /// World position of the centre.
    pub position: Point,
    /// Radius in world units.
    pub size: f64,
    /// Exempt from layout forces (pinned by definition or by dragging).
    pub fixed: bool,
    /// Pinned by a drag. Survives definition updates.
    pub dragged: bool,
    /// Whether the position came from the definition, a layouter or a drag
    /// rather than the initial spiral. Force layouts start unplaced nodes
    /// next to a placed neighbour.
    pub placed: bool,
}

impl VisualNode {
    /// Build a node from its definition. `fallback` is used when the
    /// definition has no explicit position.
    pub fn new(definition: Arc<NodeDef>, default_size: f64, fallback: Point) -> Self {
        let position = definition.position();
        Self {
            id: definition.id.clone(),
            size: definition.size.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(default_size),
            fixed: definition.fixed,
            dragged: false,
            placed: position.is_some(),
            position: position.unwrap_or(fallback),
            definition,
        }
    }

    /// Replace the definition in place, keeping the computed position.
    ///
    /// Declared coordinates only move the node when they differ from the
    /// previous definition's, so redeclaring the same graph never undoes a
    /// drag or a layout.
    pub fn update(&mut self, definition: Arc<NodeDef>, default_size: f64) {
        self.size = definition.size.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(default_size);
        let previous = self.definition.position();
        if let Some(position) = definition.position().filter(|p| Some(*p) != previous) {
            self.position = position;
            self.placed = true;
        }
        self.fixed = definition.fixed || self.dragged;
        self.definition = definition;
    }

    /// Pin the node after the user moved it.
    pub fn pin(&mut self) {
        self.dragged = true;
        self.fixed = true;
        self.placed = true;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &Arc<NodeDef> {
        &self.definition
    }

    /// Whether `point` (world coordinates) is inside the node.
    pub fn contains(&self, point: Point) -> bool {
        self.definition.shape.contains(self.position, self.size, point)
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::from_center_size(self.position, (self.size * 2.0, self.size * 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_contains() {
        let c = Point::new(0.0, 0.0);
        assert!(NodeShape::Circle.contains(c, 10.0, Point::new(6.0, 6.0)));
        assert!(!NodeShape::Circle.contains(c, 10.0, Point::new(8.0, 8.0)));
        assert!(NodeShape::Box.contains(c, 10.0, Point::new(9.0, -9.0)));
        assert!(!NodeShape::Diamond.contains(c, 10.0, Point::new(6.0, 6.0)));
        assert!(NodeShape::Diamond.contains(c, 10.0, Point::new(0.0, 9.5)));
    }

    #[test]
    fn test_update_preserves_position() {
        let def = Arc::new(NodeDef::new("a"));
        let mut node = VisualNode::new(def, 10.0, Point::new(5.0, 5.0));
        node.position = Point::new(42.0, 7.0);

        let mut next = NodeDef::new("a").with_size(20.0);
        next.label = Some("renamed".into());
        node.update(Arc::new(next), 10.0);

        assert_eq!(node.position, Point::new(42.0, 7.0));
        assert!((node.size - 20.0).abs() < f64::EPSILON);
        assert_eq!(node.definition().label.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_redeclared_position_keeps_drag() {
        let mut node = VisualNode::new(Arc::new(NodeDef::new("a").at(1.0, 2.0)), 10.0, Point::ZERO);
        node.position = Point::new(50.0, 2.0);
        node.pin();

        node.update(Arc::new(NodeDef::new("a").at(1.0, 2.0)), 10.0);
        assert_eq!(node.position, Point::new(50.0, 2.0));

        node.update(Arc::new(NodeDef::new("a").at(-4.0, 9.0)), 10.0);
        assert_eq!(node.position, Point::new(-4.0, 9.0));
    }

    #[test]
    fn test_definition_can_unpin() {
        let mut pinned = NodeDef::new("a");
        pinned.fixed = true;
        let mut node = VisualNode::new(Arc::new(pinned), 10.0, Point::ZERO);
        assert!(node.fixed);

        node.update(Arc::new(NodeDef::new("a")), 10.0);
        assert!(!node.fixed);

        // A drag pins regardless of the definition.
        node.pin();
        node.update(Arc::new(NodeDef::new("a")), 10.0);
        assert!(node.fixed);
    }

    #[test]
    fn test_explicit_position() {
        let node = VisualNode::new(Arc::new(NodeDef::new("a").at(1.0, 2.0)), 10.0, Point::ZERO);
        assert_eq!(node.position, Point::new(1.0, 2.0));
        assert!(node.placed);
    }

    #[test]
    fn test_invalid_size_falls_back() {
        let node = VisualNode::new(Arc::new(NodeDef::new("a").with_size(-3.0)), 10.0, Point::ZERO);
        assert!((node.size - 10.0).abs() < f64::EPSILON);
    }
}
