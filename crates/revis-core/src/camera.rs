//! Camera module for pan/zoom transforms and animated transitions.

use crate::options::CameraOptions;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frame rate that per-frame quantities (edge-pan, key steps) are tuned for.
pub const REFERENCE_FPS: f64 = 60.0;

/// Scale used when there is nothing to fit or a value became non-finite.
pub const DEFAULT_SCALE: f64 = 1.0;

/// Wheel delta equivalent of a double-click zoom.
pub const DOUBLE_CLICK_WHEEL_DELTA: f64 = -150.0;

const SCALE_EPSILON: f64 = 1e-3;
const PAN_EPSILON: f64 = 0.5;
/// Minimum interpolation fraction per animation step, so zero-length
/// frames still converge.
const MIN_ANIMATION_STEP: f64 = 0.05;

/// Number of reference frames covered by `dt`.
pub fn reference_frames(dt: Duration) -> f64 {
    dt.as_secs_f64() * REFERENCE_FPS
}

/// Semantic camera action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    ZoomIn,
    ZoomOut,
}

impl KeyAction {
    /// Map a key name (as reported by the host) to an action.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" | "a" | "A" => Some(KeyAction::PanLeft),
            "ArrowRight" | "Right" | "d" | "D" => Some(KeyAction::PanRight),
            "ArrowUp" | "Up" | "w" | "W" => Some(KeyAction::PanUp),
            "ArrowDown" | "Down" | "s" | "S" => Some(KeyAction::PanDown),
            "+" | "=" => Some(KeyAction::ZoomIn),
            "-" | "_" => Some(KeyAction::ZoomOut),
            _ => None,
        }
    }
}

/// Read-only snapshot of the camera handed to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub pan: Vec2,
    pub scale: f64,
    pub destination_pan: Option<Vec2>,
    pub destination_scale: Option<f64>,
    pub pan_per_frame: Option<Vec2>,
}

/// Camera manages the view transform of the network.
///
/// `screen = world * scale + pan`. A transition in flight is described by
/// the destination fields; an edge-triggered auto-pan by `pan_per_frame`.
/// The two never drive the same frame: starting one clears the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset in screen pixels.
    pub pan: Vec2,
    /// Current zoom level.
    pub scale: f64,
    /// Minimum allowed zoom level.
    pub min_scale: f64,
    /// Maximum allowed zoom level.
    pub max_scale: f64,
    destination_pan: Option<Vec2>,
    destination_scale: Option<f64>,
    /// Edge-pan velocity in world units per reference frame.
    pan_per_frame: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: DEFAULT_SCALE,
            min_scale: 0.05,
            max_scale: 10.0,
            destination_pan: None,
            destination_scale: None,
            pan_per_frame: None,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera using the limits from the options.
    pub fn from_options(options: &CameraOptions) -> Self {
        let mut camera = Self::default();
        camera.set_limits(options.min_scale, options.max_scale);
        camera
    }

    /// Update the zoom limits, re-clamping the current scale.
    pub fn set_limits(&mut self, min_scale: f64, max_scale: f64) {
        let (min_scale, max_scale) = if min_scale <= max_scale {
            (min_scale, max_scale)
        } else {
            (max_scale, min_scale)
        };
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self.scale = self.clamp_scale(self.scale);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CameraState {
        CameraState {
            pan: self.pan,
            scale: self.scale,
            destination_pan: self.destination_pan,
            destination_scale: self.destination_scale,
            pan_per_frame: self.pan_per_frame,
        }
    }

    /// Get the affine transform for rendering (world to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.scale)
    }

    /// Get the inverse transform for input handling (screen to world).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.pan)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Whether an animated transition is in flight.
    pub fn is_animating(&self) -> bool {
        self.destination_pan.is_some() || self.destination_scale.is_some()
    }

    /// Edge-pan velocity, if active.
    pub fn pan_per_frame(&self) -> Option<Vec2> {
        self.pan_per_frame
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            DEFAULT_SCALE.clamp(self.min_scale, self.max_scale)
        }
    }

    /// Pan the camera by a delta in screen coordinates.
    ///
    /// Manual panning takes over from any running transition.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.cancel_animation();
        self.pan += delta;
        self.sanitize();
    }

    /// Pan by a screen delta while keeping any running transition. The
    /// destination moves along so the zoom still lands on the same content.
    pub fn shift(&mut self, delta: Vec2) {
        self.pan += delta;
        if let Some(destination) = self.destination_pan.as_mut() {
            *destination += delta;
        }
        self.sanitize();
    }

    /// Set pan and scale immediately.
    pub fn set(&mut self, pan: Vec2, scale: f64) {
        self.cancel_animation();
        self.pan = pan;
        self.scale = self.clamp_scale(scale);
        self.sanitize();
    }

    /// Drop any running transition.
    pub fn cancel_animation(&mut self) {
        self.destination_pan = None;
        self.destination_scale = None;
    }

    /// Pan/scale that keeps `screen_point` fixed while scaling to `new_scale`.
    fn zoom_about(&self, pan: Vec2, scale: f64, screen_point: Point, new_scale: f64) -> Vec2 {
        let new_scale = self.clamp_scale(new_scale);
        let anchor = screen_point.to_vec2();
        anchor - (anchor - pan) * (new_scale / scale)
    }

    /// Zoom the camera immediately, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = self.clamp_scale(self.scale * factor);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        self.pan = self.zoom_about(self.pan, self.scale, screen_point, new_scale);
        self.scale = new_scale;
        self.sanitize();
    }

    /// Compute the pan/scale a wheel event leads to.
    ///
    /// Negative `delta_y` zooms in. The world point under the cursor stays put.
    pub fn wheel_target(&self, screen_point: Point, delta_y: f64, sensitivity: f64) -> (Vec2, f64) {
        let factor = (-delta_y * sensitivity).exp();
        let new_scale = self.clamp_scale(self.scale * factor);
        let pan = self.zoom_about(self.pan, self.scale, screen_point, new_scale);
        (pan, new_scale)
    }

    /// Apply a wheel event immediately.
    pub fn zoom_from_wheel(&mut self, screen_point: Point, delta_y: f64, sensitivity: f64) {
        let (pan, scale) = self.wheel_target(screen_point, delta_y, sensitivity);
        self.set(pan, scale);
    }

    /// Start an animated transition towards `pan` / `scale`.
    pub fn zoom_to_destination(&mut self, pan: Vec2, scale: f64) {
        let scale = self.clamp_scale(scale);
        if !pan.x.is_finite() || !pan.y.is_finite() {
            log::warn!("Ignoring non-finite camera destination");
            return;
        }
        self.pan_per_frame = None;
        self.destination_pan = Some(pan);
        self.destination_scale = Some(scale);
    }

    /// Where the camera is heading: the destination if animating, else the
    /// current state.
    fn target(&self) -> (Vec2, f64) {
        (
            self.destination_pan.unwrap_or(self.pan),
            self.destination_scale.unwrap_or(self.scale),
        )
    }

    /// Animate a zoom in by `step` around the screen centre.
    pub fn zoom_in(&mut self, screen: Size, step: f64) {
        let (pan, scale) = self.target();
        let new_scale = self.clamp_scale(scale * step);
        let centre = Point::new(screen.width / 2.0, screen.height / 2.0);
        let pan = self.zoom_about(pan, scale, centre, new_scale);
        self.zoom_to_destination(pan, new_scale);
    }

    /// Animate a zoom out by `step` around the screen centre.
    ///
    /// Stops at the scale that fits `bounds` unless the camera is already
    /// further out, and never below the minimum scale.
    pub fn zoom_out(&mut self, screen: Size, bounds: Option<Rect>, step: f64, padding: f64) {
        let (pan, scale) = self.target();
        let floor = match bounds {
            Some(bounds) => fit_scale(bounds, screen, padding)
                .unwrap_or(self.min_scale)
                .min(scale),
            None => self.min_scale,
        };
        let new_scale = self.clamp_scale((scale / step).max(floor));
        let centre = Point::new(screen.width / 2.0, screen.height / 2.0);
        let pan = self.zoom_about(pan, scale, centre, new_scale);
        self.zoom_to_destination(pan, new_scale);
    }

    /// Pan/scale that centres `bounds` in the viewport with `padding`.
    ///
    /// Empty or degenerate input falls back to the default scale centred on
    /// the world origin.
    pub fn fit_target(&self, bounds: Option<Rect>, screen: Size, padding: f64) -> (Vec2, f64) {
        let centre = Vec2::new(screen.width / 2.0, screen.height / 2.0);
        let fallback = (centre, self.clamp_scale(DEFAULT_SCALE));
        let Some(bounds) = bounds else {
            return fallback;
        };
        let Some(scale) = fit_scale(bounds, screen, padding) else {
            return fallback;
        };
        let scale = self.clamp_scale(scale);
        let pan = centre - bounds.center().to_vec2() * scale;
        if pan.x.is_finite() && pan.y.is_finite() {
            (pan, scale)
        } else {
            fallback
        }
    }

    /// Animate towards showing the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Option<Rect>, screen: Size, padding: f64) {
        let (pan, scale) = self.fit_target(bounds, screen, padding);
        self.zoom_to_destination(pan, scale);
    }

    /// Advance the running transition. Returns whether it is still running.
    pub fn advance_animation(&mut self, dt: Duration, rate: f64) -> bool {
        if !self.is_animating() {
            return false;
        }
        let (pan_target, scale_target) = self.target();
        let k = (1.0 - (-rate * dt.as_secs_f64()).exp()).clamp(MIN_ANIMATION_STEP, 1.0);

        self.scale += (scale_target - self.scale) * k;
        self.pan += (pan_target - self.pan) * k;

        let settled = (scale_target - self.scale).abs() < SCALE_EPSILON
            && (pan_target - self.pan).hypot() < PAN_EPSILON;
        if settled {
            self.scale = scale_target;
            self.pan = pan_target;
            self.cancel_animation();
        }
        self.sanitize();
        self.is_animating()
    }

    /// Start, update or stop edge-pan.
    pub fn set_edge_pan(&mut self, pan_per_frame: Option<Vec2>) {
        if pan_per_frame.is_some() {
            self.cancel_animation();
        }
        self.pan_per_frame = pan_per_frame;
    }

    /// Advance edge-pan by `dt`. Returns the world-space shift that dragged
    /// nodes must receive to stay under the pointer.
    pub fn advance_edge_pan(&mut self, dt: Duration) -> Option<Vec2> {
        let per_frame = self.pan_per_frame?;
        let world = per_frame * reference_frames(dt);
        self.pan += world * self.scale;
        self.sanitize();
        Some(-world)
    }

    /// Apply one tick of a keyboard action.
    pub fn apply_key_action(
        &mut self,
        action: KeyAction,
        screen: Size,
        options: &CameraOptions,
        dt: Duration,
    ) {
        let frames = reference_frames(dt);
        let step = options.key_pan_step * frames;
        let centre = Point::new(screen.width / 2.0, screen.height / 2.0);
        match action {
            KeyAction::PanLeft => self.shift(Vec2::new(step, 0.0)),
            KeyAction::PanRight => self.shift(Vec2::new(-step, 0.0)),
            KeyAction::PanUp => self.shift(Vec2::new(0.0, step)),
            KeyAction::PanDown => self.shift(Vec2::new(0.0, -step)),
            KeyAction::ZoomIn => {
                self.cancel_animation();
                self.zoom_at(centre, options.key_zoom_factor.powf(frames));
            }
            KeyAction::ZoomOut => {
                self.cancel_animation();
                self.zoom_at(centre, options.key_zoom_factor.powf(-frames));
            }
        }
    }

    /// Replace non-finite values with defaults.
    pub fn sanitize(&mut self) {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            log::warn!("Camera scale became {}, resetting", self.scale);
            self.scale = self.clamp_scale(DEFAULT_SCALE);
        }
        if !self.pan.x.is_finite() || !self.pan.y.is_finite() {
            log::warn!("Camera pan became non-finite, resetting");
            self.pan = Vec2::ZERO;
        }
    }
}

/// Scale that fits `bounds` into `screen` minus `padding` on each side.
fn fit_scale(bounds: Rect, screen: Size, padding: f64) -> Option<f64> {
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return None;
    }
    let width = (screen.width - padding * 2.0).max(1.0);
    let height = (screen.height - padding * 2.0).max(1.0);
    let scale = (width / bounds.width()).min(height / bounds.height());
    scale.is_finite().then_some(scale)
}

/// Edge-pan velocity for a pointer at `position` on a surface of `screen`.
///
/// Inside the `margin` band the velocity grows linearly with penetration up
/// to `speed` pixels per frame; the result is in world units.
pub fn screen_edge_pan(
    position: Point,
    screen: Size,
    margin: f64,
    speed: f64,
    scale: f64,
) -> Option<Vec2> {
    if margin <= 0.0 || screen.width <= 0.0 || screen.height <= 0.0 {
        return None;
    }
    let axis = |value: f64, extent: f64| -> f64 {
        if value < margin {
            ((margin - value) / margin).min(1.0)
        } else if value > extent - margin {
            -((value - (extent - margin)) / margin).min(1.0)
        } else {
            0.0
        }
    };
    let penetration = Vec2::new(axis(position.x, screen.width), axis(position.y, screen.height));
    if penetration == Vec2::ZERO {
        return None;
    }
    Some(penetration * speed / scale)
}
