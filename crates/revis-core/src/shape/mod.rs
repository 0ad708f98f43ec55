//! Free-form overlay shapes.
//!
//! Shapes are rectangles drawn over the graph. Their order in the list is
//! their z-order (back to front); clicking a shape brings it to the front.

mod handles;

pub use handles::{
    Corner, Edge, HANDLE_SIZE, Handle, HandleKind, MIN_SHAPE_SIZE, apply_handle_drag, get_handles,
    handle_at,
};

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A positioned, sized overlay region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Immutable to interaction: can be clicked but not moved or resized.
    #[serde(default)]
    pub no_edit: bool,
    /// Opaque host data.
    #[serde(default)]
    pub data: Value,
}

impl Shape {
    pub fn new(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Mark the shape as not editable.
    pub fn locked(mut self) -> Self {
        self.no_edit = true;
        self
    }

    /// Get the shape as a kurbo Rect.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs()
    }

    /// Replace position and size from a rectangle.
    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.x = rect.x0;
        self.y = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }

    pub fn contains(&self, point: Point) -> bool {
        let rect = self.rect();
        // Inclusive on every side, unlike Rect::contains.
        point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Topmost shape containing `point`.
pub fn shape_at(shapes: &[Shape], point: Point) -> Option<&Shape> {
    shapes.iter().rev().find(|shape| shape.contains(point))
}

/// Move the shape with `id` to the end of the list (front of the z-order).
/// Returns whether the shape was found.
pub fn bring_to_front(shapes: &mut Vec<Shape>, id: &str) -> bool {
    match shapes.iter().position(|shape| shape.id == id) {
        Some(index) => {
            let shape = shapes.remove(index);
            shapes.push(shape);
            true
        }
        None => false,
    }
}
