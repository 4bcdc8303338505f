// src/engine_lib/controller.rs

use glam::Vec3;

/// Collects look and movement input between frames.
///
/// Movement keys are DOM `KeyboardEvent.code` names. While disabled all input is
/// dropped, so nothing queued before a pause leaks into the next frame.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub camera_pos_delta: Vec3,
    pub mouse_dx_accum: f32,
    pub mouse_dy_accum: f32,
    pub mouse_sensitivity: f32,
    enabled: bool,
}

impl CameraController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            camera_pos_delta: Vec3::ZERO,
            mouse_dx_accum: 0.0,
            mouse_dy_accum: 0.0,
            mouse_sensitivity: sensitivity,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.camera_pos_delta = Vec3::ZERO;
            self.mouse_dx_accum = 0.0;
            self.mouse_dy_accum = 0.0;
        }
    }

    /// Returns `true` when `code` is a movement key.
    pub fn handle_key(&mut self, code: &str, pressed: bool) -> bool {
        let amount = if pressed && self.enabled { 1.0 } else { 0.0 };
        match code {
            "KeyW" | "ArrowUp" => { self.camera_pos_delta.z = -amount; true }
            "KeyS" | "ArrowDown" => { self.camera_pos_delta.z = amount; true }
            "KeyA" | "ArrowLeft" => { self.camera_pos_delta.x = -amount; true }
            "KeyD" | "ArrowRight" => { self.camera_pos_delta.x = amount; true }
            // CSS y grows downward.
            "Space" => { self.camera_pos_delta.y = -amount; true }
            "ShiftLeft" | "ControlLeft" => { self.camera_pos_delta.y = amount; true }
            _ => false,
        }
    }

    pub fn handle_mouse_motion(&mut self, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        self.mouse_dx_accum += dx;
        self.mouse_dy_accum += dy;
    }

    /// Accumulated look rotation in radians `(yaw, pitch)`, reset on read.
    pub fn take_look_delta(&mut self) -> (f32, f32) {
        let delta = (
            self.mouse_dx_accum * self.mouse_sensitivity,
            self.mouse_dy_accum * self.mouse_sensitivity,
        );
        self.mouse_dx_accum = 0.0;
        self.mouse_dy_accum = 0.0;
        delta
    }
}
