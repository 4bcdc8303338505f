// src/config.rs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Scene settings, loadable from TOML. Missing keys fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Scale factor stamped onto nodes when they are created.
    pub unit_value: f32,
    pub viewport_class: String,
    pub ambient_class: String,
    /// CSS `perspective` of the viewport, in pixels.
    pub perspective: f32,
    /// Pause when an Escape keypress reaches the scene.
    pub escape_pauses: bool,
    pub camera: CameraConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians of look rotation per pixel of pointer motion.
    pub mouse_sensitivity: f32,
    /// Pixels per second.
    pub move_speed: f32,
    pub pitch_limit: f32,
    pub eye_height: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            unit_value: 1.0,
            viewport_class: "scene-viewport".to_string(),
            ambient_class: "scene-ambient".to_string(),
            perspective: 600.0,
            escape_pauses: true,
            camera: CameraConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.002,
            move_speed: 240.0,
            pitch_limit: std::f32::consts::FRAC_PI_2 - 0.01,
            eye_height: 0.0,
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
