//! Network configuration.
//!
//! Options are plain serde structs with defaults. Hosts supply partial JSON
//! which is deep-merged over the current values: objects merge key by key,
//! everything else replaces.

use crate::error::OptionsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hover popup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverOptions {
    /// Dwell time before a hover popup is shown, in milliseconds.
    pub delay_ms: u64,
    /// Screen-space offset of the popup from the hovered point.
    pub offset: f64,
}

impl Default for HoverOptions {
    fn default() -> Self {
        Self {
            delay_ms: 750,
            offset: 12.0,
        }
    }
}

/// Which interaction modes are enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionOptions {
    pub allow_graph_interaction: bool,
    pub allow_shape_interaction: bool,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            allow_graph_interaction: true,
            allow_shape_interaction: false,
        }
    }
}

/// Edge hit-testing and curve configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeOptions {
    /// Hit tolerance in screen pixels.
    pub hit_tolerance: f64,
    /// World-space offset between parallel edges.
    pub duplicate_spacing: f64,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        Self {
            hit_tolerance: 6.0,
            duplicate_spacing: 20.0,
        }
    }
}

/// Node defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeOptions {
    /// Radius used when a node definition has no size.
    pub default_size: f64,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self { default_size: 10.0 }
    }
}

/// Camera behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Screen padding kept around the content when fitting.
    pub fit_all_padding: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per wheel delta unit (exponential).
    pub wheel_sensitivity: f64,
    /// Factor applied by the zoom-in / zoom-out controls.
    pub zoom_step: f64,
    /// Exponential ease rate of animated transitions, per second.
    pub animation_rate: f64,
    /// Width of the viewport band that triggers edge-pan, in pixels.
    pub edge_pan_margin: f64,
    /// Edge-pan speed at full penetration, in pixels per frame.
    pub edge_pan_speed: f64,
    /// Keyboard pan distance per frame, in pixels.
    pub key_pan_step: f64,
    /// Keyboard zoom factor per frame.
    pub key_zoom_factor: f64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fit_all_padding: 10.0,
            min_scale: 0.05,
            max_scale: 10.0,
            wheel_sensitivity: 0.0015,
            zoom_step: 1.25,
            animation_rate: 12.0,
            edge_pan_margin: 40.0,
            edge_pan_speed: 12.0,
            key_pan_step: 10.0,
            key_zoom_factor: 1.02,
        }
    }
}

/// Full configuration of a network.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
    pub hover: HoverOptions,
    pub interaction: InteractionOptions,
    pub edges: EdgeOptions,
    pub nodes: NodeOptions,
    pub camera: CameraOptions,
    /// Opaque options forwarded to the layouter.
    pub layout_options: Value,
}

impl NetworkOptions {
    /// Defaults with `overrides` deep-merged on top.
    pub fn merged(overrides: &Value) -> Result<Self, OptionsError> {
        Self::default().merge(overrides)
    }

    /// Return a copy of these options with `overrides` deep-merged on top.
    pub fn merge(&self, overrides: &Value) -> Result<Self, OptionsError> {
        let mut base = serde_json::to_value(self)?;
        deep_merge(&mut base, overrides);
        Ok(serde_json::from_value(base)?)
    }
}

/// Merge `patch` into `target`. Objects are merged recursively; any other
/// value (arrays included) replaces the target. `null` patches are ignored.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (target, patch) => *target = patch.clone(),
    }
}
