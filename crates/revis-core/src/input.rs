//! Raw input events and per-session pointer tracking.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether the modifiers request "add to selection" / constrained resize.
    pub fn is_additive(&self) -> bool {
        self.ctrl || self.meta || self.shift
    }
}

/// Pointer event in screen coordinates (relative to the drawing surface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Leave,
    DoubleClick {
        position: Point,
    },
    Wheel {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    /// Screen position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::DoubleClick { position }
            | PointerEvent::Wheel { position, .. } => Some(*position),
            PointerEvent::Leave => None,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Any raw input event, forwarded to the host alongside semantic events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

/// Tracks pointer position across events so movement can be derived.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    /// Modifiers seen on the last pointer event.
    pub modifiers: Modifiers,
    /// Whether the pointer is inside the surface.
    pub inside: bool,
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match event {
            PointerEvent::Down { position, modifiers, .. }
            | PointerEvent::Move { position, modifiers } => {
                self.move_to(*position);
                self.modifiers = *modifiers;
            }
            PointerEvent::Up { position, .. }
            | PointerEvent::DoubleClick { position }
            | PointerEvent::Wheel { position, .. } => self.move_to(*position),
            PointerEvent::Leave => {
                self.inside = false;
            }
        }
    }

    fn move_to(&mut self, position: Point) {
        // Re-entering the surface must not produce a jump.
        if !self.inside {
            self.pointer_position = position;
            self.inside = true;
        }
        self.previous_pointer_position = self.pointer_position;
        self.pointer_position = position;
    }

    /// Get the pointer movement delta of the last event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }
}
