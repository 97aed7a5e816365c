//! Session configuration.
//!
//! Every field has a default, so a settings file only needs the values it
//! changes:
//!
//! ```json
//! {
//!     "flow_field": { "influence": 0.8, "strength": 4.0 },
//!     "render": { "point_size": 0.05, "clear_color": [16, 16, 24] },
//!     "seed": 42
//! }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flow::{clamp_param, FlowFieldParams, StepConstants, POINT_SIZE_RANGE};

/// Appearance of the render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Base sprite size, in `[0, 1]`.
    pub point_size: f32,
    /// Background color, sRGB bytes.
    pub clear_color: [u8; 3],
    /// Cap on device pixels per point.
    pub max_pixel_ratio: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            point_size: 0.07,
            clear_color: [0x29, 0x19, 0x1f],
            max_pixel_ratio: 2.0,
        }
    }
}

impl RenderSettings {
    /// Set the point size, clamped to `[0, 1]`.
    pub fn set_point_size(&mut self, value: f32) -> f32 {
        self.point_size = clamp_param("point size", value, &POINT_SIZE_RANGE);
        self.point_size
    }

    /// Background color for the render pass clear, in linear space.
    pub fn clear_color_linear(&self) -> wgpu::Color {
        let [r, g, b] = self.clear_color.map(srgb_to_linear);
        wgpu::Color { r, g, b, a: 1.0 }
    }
}

fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Initial camera placement and projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of orbit velocity lost per frame, in `[0, 1]`.
    pub damping: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.5, 4.0, 15.0),
            target: Vec3::ZERO,
            fov_degrees: 35.0,
            near: 0.1,
            far: 100.0,
            damping: 0.05,
        }
    }
}

/// Window creation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Flow Field Particles".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Everything a session reads at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub flow_field: FlowFieldParams,
    pub step: StepConstants,
    pub render: RenderSettings,
    pub camera: CameraSettings,
    pub window: WindowSettings,
    /// Seed for the random life and size attributes. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl FlowConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON settings document. Tweak values are clamped to range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.clamped())
    }

    /// Read a JSON settings file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded settings from '{}'", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn clamped(mut self) -> Self {
        self.flow_field = self.flow_field.clamped();
        self.step = self.step.clamped();
        self.render.set_point_size(self.render.point_size);
        self
    }

    /// Set the flow field parameters.
    pub fn with_flow_field(mut self, flow_field: FlowFieldParams) -> Self {
        self.flow_field = flow_field.clamped();
        self
    }

    /// Set the step tuning constants, clamped to range.
    pub fn with_step_constants(mut self, step: StepConstants) -> Self {
        self.step = step.clamped();
        self
    }

    /// Set the base point size.
    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.render.set_point_size(point_size);
        self
    }

    /// Seed the random particle attributes.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo() {
        let config = FlowConfig::default();
        assert_eq!(config.flow_field, FlowFieldParams::default());
        assert_eq!(config.render.point_size, 0.07);
        assert_eq!(config.render.clear_color, [0x29, 0x19, 0x1f]);
        assert_eq!(config.camera.fov_degrees, 35.0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_partial_json() {
        let config = FlowConfig::from_json_str(
            r#"{ "flow_field": { "strength": 4.0 }, "seed": 9 }"#,
        )
        .unwrap();
        assert_eq!(config.flow_field.strength, 4.0);
        assert_eq!(config.flow_field.influence, 0.5);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.window, WindowSettings::default());
    }

    #[test]
    fn test_json_values_are_clamped() {
        let config = FlowConfig::from_json_str(
            r#"{ "flow_field": { "frequency": 3.0 }, "render": { "point_size": -1.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.flow_field.frequency, 1.0);
        assert_eq!(config.render.point_size, 0.0);
    }

    #[test]
    fn test_json_step_constants_are_clamped() {
        let config = FlowConfig::from_json_str(r#"{ "step": { "respawn_rate": -1.0 } }"#).unwrap();
        assert_eq!(config.step.respawn_rate, 0.0);

        // 1e39 overflows f32 to infinity
        let config = FlowConfig::from_json_str(
            r#"{ "step": { "respawn_rate": 1e39, "time_scale": 1e39, "shape_frequency": -1e39 } }"#,
        )
        .unwrap();
        assert!(config.step.respawn_rate.is_finite());
        assert_eq!(config.step.respawn_rate, 10.0);
        assert_eq!(config.step.time_scale, 10.0);
        assert_eq!(config.step.shape_frequency, 0.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = FlowConfig::new().with_seed(5).with_point_size(0.2);
        let parsed = FlowConfig::from_json_str(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_json() {
        let err = FlowConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = FlowConfig::from_json_file("no/such/settings.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_clear_color_linear() {
        let render = RenderSettings {
            clear_color: [255, 0, 0],
            ..Default::default()
        };
        let color = render.clear_color_linear();
        assert!((color.r - 1.0).abs() < 1e-9);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.a, 1.0);
    }
}
