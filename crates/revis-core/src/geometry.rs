//! Bounds, edge curves and graph hit-testing.
//!
//! All functions here work in world coordinates. Callers convert pointer
//! positions with [`Camera::screen_to_world`](crate::Camera::screen_to_world)
//! and divide pixel tolerances by the camera scale, so hit areas keep a
//! constant size on screen.

use crate::graph::{EdgeKey, EdgeTable, NodeKey, NodeTable, VisualEdge};
use crate::shape::Shape;
use kurbo::{Line, ParamCurveNearest, Point, QuadBez, Rect, Vec2};

const NEAREST_ACCURACY: f64 = 1e-6;

/// Bounding box of all node discs and shape rectangles.
pub fn bounds_of(nodes: &NodeTable, shapes: &[Shape]) -> Option<Rect> {
    nodes
        .iter()
        .map(|(_, node)| node.bounds())
        .chain(shapes.iter().map(Shape::rect))
        .filter(|rect| {
            rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()
        })
        .reduce(|acc, rect| acc.union(rect))
}

/// Topmost node (last in draw order) containing `point`.
pub fn node_at(nodes: &NodeTable, point: Point) -> Option<NodeKey> {
    nodes
        .iter()
        .rev()
        .find(|(_, node)| node.contains(point))
        .map(|(key, _)| key)
}

/// Geometry an edge is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeCurve {
    Line(Line),
    /// Offset curve for parallel edges.
    Quad(QuadBez),
    /// Self-loop drawn as a circle touching its node.
    Loop { center: Point, radius: f64 },
}

impl EdgeCurve {
    /// Distance from `point` to the curve.
    pub fn distance(&self, point: Point) -> f64 {
        match self {
            EdgeCurve::Line(line) => line.nearest(point, NEAREST_ACCURACY).distance_sq.sqrt(),
            EdgeCurve::Quad(quad) => quad.nearest(point, NEAREST_ACCURACY).distance_sq.sqrt(),
            EdgeCurve::Loop { center, radius } => ((point - *center).hypot() - radius).abs(),
        }
    }
}

/// Curve for `edge`. `spacing` is the world distance between parallel edges.
///
/// The offset side is derived from the endpoint ids, not the edge direction,
/// so A→B and B→A edges spread apart instead of overlapping.
pub fn edge_curve(edge: &VisualEdge, nodes: &NodeTable, spacing: f64) -> Option<EdgeCurve> {
    let from = nodes.get(edge.from())?;
    let to = nodes.get(edge.to())?;
    let index = edge.duplicate_index();

    if edge.is_self_loop() {
        let radius = from.size * 0.75 + index as f64 * spacing * 0.5;
        let center = from.position - Vec2::new(0.0, from.size * 0.5 + radius);
        return Some(EdgeCurve::Loop { center, radius });
    }

    let (p0, p1) = (from.position, to.position);
    if index == 0 {
        return Some(EdgeCurve::Line(Line::new(p0, p1)));
    }

    let (a, b) = if from.id() <= to.id() { (p0, p1) } else { (p1, p0) };
    let dir = b - a;
    let length = dir.hypot();
    if length < f64::EPSILON {
        return Some(EdgeCurve::Line(Line::new(p0, p1)));
    }
    let normal = Vec2::new(-dir.y, dir.x) / length;
    let side = if index % 2 == 1 { 1.0 } else { -1.0 };
    let offset = index.div_ceil(2) as f64 * spacing;
    // A quadratic's apex sits halfway to its control point.
    let control = p0.midpoint(p1) + normal * (side * offset * 2.0);
    Some(EdgeCurve::Quad(QuadBez::new(p0, control, p1)))
}

/// Edge closest to `point` within `tolerance` (world units).
pub fn edge_at(
    edges: &EdgeTable,
    nodes: &NodeTable,
    point: Point,
    tolerance: f64,
    spacing: f64,
) -> Option<EdgeKey> {
    edges
        .iter()
        .rev()
        .filter_map(|(key, edge)| {
            let distance = edge_curve(edge, nodes, spacing)?.distance(point);
            (distance <= tolerance).then_some((key, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key)
}
