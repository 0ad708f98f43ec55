//! Resize handles for shapes.

use super::Shape;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Smallest width/height a handle drag may produce, in world units.
pub const MIN_SHAPE_SIZE: f64 = 1.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

/// A handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a world point lies in this handle's square of half-size
    /// `half_size` (world units).
    pub fn hit_test(&self, point: Point, half_size: f64) -> bool {
        let offset = point - self.position;
        offset.x.abs() <= half_size && offset.y.abs() <= half_size
    }
}

/// The eight resize handles of a shape: corners first, then edge midpoints.
pub fn get_handles(shape: &Shape) -> Vec<Handle> {
    let b = shape.rect();
    let c = b.center();
    vec![
        Handle::new(Point::new(b.x0, b.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(b.x1, b.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(b.x0, b.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(b.x1, b.y1), HandleKind::Corner(Corner::BottomRight)),
        Handle::new(Point::new(c.x, b.y0), HandleKind::Edge(Edge::Top)),
        Handle::new(Point::new(b.x1, c.y), HandleKind::Edge(Edge::Right)),
        Handle::new(Point::new(c.x, b.y1), HandleKind::Edge(Edge::Bottom)),
        Handle::new(Point::new(b.x0, c.y), HandleKind::Edge(Edge::Left)),
    ]
}

/// Find which handle of `shape` is under the world point.
///
/// Handles keep a constant on-screen size, so the hit square shrinks in
/// world units as the camera zooms in.
pub fn handle_at(shape: &Shape, point: Point, scale: f64) -> Option<HandleKind> {
    let half_size = HANDLE_SIZE / 2.0 / scale;
    get_handles(shape)
        .into_iter()
        .find(|handle| handle.hit_test(point, half_size))
        .map(|handle| handle.kind)
}

/// Resize `original` by dragging `handle` by `delta` (world units).
///
/// Edges never cross: the dragged side stops `MIN_SHAPE_SIZE` short of the
/// opposite one. With `constrained`, corner drags keep the aspect ratio and
/// edge drags resize symmetrically about the centre.
pub fn apply_handle_drag(
    original: Rect,
    handle: HandleKind,
    delta: Vec2,
    constrained: bool,
) -> Rect {
    let Rect { x0, y0, x1, y1 } = original;
    match handle {
        HandleKind::Corner(corner) => {
            let (mut nx0, mut ny0, mut nx1, mut ny1) = match corner {
                Corner::TopLeft => (
                    (x0 + delta.x).min(x1 - MIN_SHAPE_SIZE),
                    (y0 + delta.y).min(y1 - MIN_SHAPE_SIZE),
                    x1,
                    y1,
                ),
                Corner::TopRight => (
                    x0,
                    (y0 + delta.y).min(y1 - MIN_SHAPE_SIZE),
                    (x1 + delta.x).max(x0 + MIN_SHAPE_SIZE),
                    y1,
                ),
                Corner::BottomLeft => (
                    (x0 + delta.x).min(x1 - MIN_SHAPE_SIZE),
                    y0,
                    x1,
                    (y1 + delta.y).max(y0 + MIN_SHAPE_SIZE),
                ),
                Corner::BottomRight => (
                    x0,
                    y0,
                    (x1 + delta.x).max(x0 + MIN_SHAPE_SIZE),
                    (y1 + delta.y).max(y0 + MIN_SHAPE_SIZE),
                ),
            };
            if constrained && original.width() > 0.0 && original.height() > 0.0 {
                let factor = ((nx1 - nx0) / original.width()).max((ny1 - ny0) / original.height());
                let width = original.width() * factor;
                let height = original.height() * factor;
                match corner {
                    Corner::TopLeft => {
                        nx0 = x1 - width;
                        ny0 = y1 - height;
                    }
                    Corner::TopRight => {
                        nx1 = x0 + width;
                        ny0 = y1 - height;
                    }
                    Corner::BottomLeft => {
                        nx0 = x1 - width;
                        ny1 = y0 + height;
                    }
                    Corner::BottomRight => {
                        nx1 = x0 + width;
                        ny1 = y0 + height;
                    }
                }
            }
            Rect::new(nx0, ny0, nx1, ny1)
        }
        HandleKind::Edge(edge) => {
            let center = original.center();
            let half_min = MIN_SHAPE_SIZE / 2.0;
            match (edge, constrained) {
                (Edge::Top, false) => {
                    Rect::new(x0, (y0 + delta.y).min(y1 - MIN_SHAPE_SIZE), x1, y1)
                }
                (Edge::Bottom, false) => {
                    Rect::new(x0, y0, x1, (y1 + delta.y).max(y0 + MIN_SHAPE_SIZE))
                }
                (Edge::Left, false) => {
                    Rect::new((x0 + delta.x).min(x1 - MIN_SHAPE_SIZE), y0, x1, y1)
                }
                (Edge::Right, false) => {
                    Rect::new(x0, y0, (x1 + delta.x).max(x0 + MIN_SHAPE_SIZE), y1)
                }
                (Edge::Top, true) => {
                    let half = (original.height() / 2.0 - delta.y).max(half_min);
                    Rect::new(x0, center.y - half, x1, center.y + half)
                }
                (Edge::Bottom, true) => {
                    let half = (original.height() / 2.0 + delta.y).max(half_min);
                    Rect::new(x0, center.y - half, x1, center.y + half)
                }
                (Edge::Left, true) => {
                    let half = (original.width() / 2.0 - delta.x).max(half_min);
                    Rect::new(center.x - half, y0, center.x + half, y1)
                }
                (Edge::Right, true) => {
                    let half = (original.width() / 2.0 + delta.x).max(half_min);
                    Rect::new(center.x - half, y0, center.x + half, y1)
                }
            }
        }
    }
}
