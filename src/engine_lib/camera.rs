// src/engine_lib/camera.rs

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;
use crate::engine_lib::controller::CameraController;
use crate::engine_lib::scene_types::NodeKey;

/// What a scene needs from its camera.
///
/// The scene places the camera on its ambient root, links it while running and
/// unlinks it while paused, and writes [`CameraRig::view_transform`] onto the
/// anchor node every frame.
pub trait CameraRig {
    fn place(&mut self, anchor: NodeKey);
    fn anchor(&self) -> Option<NodeKey>;
    fn link(&mut self);
    fn unlink(&mut self);
    fn is_linked(&self) -> bool;
    fn update(&mut self, dt: f32);
    fn view_transform(&self) -> Mat4;

    fn handle_mouse_motion(&mut self, _dx: f32, _dy: f32) {}
    fn handle_key(&mut self, _code: &str, _pressed: bool) {}
}

/// Yaw/pitch camera walking in the horizontal plane.
///
/// CSS has no camera, so the view is produced by moving the world: the anchor
/// receives the inverse of the camera pose, pushed back by the viewport
/// perspective so the eye sits at the perspective origin.
#[derive(Debug, Clone)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub move_speed: f32,
    pub pitch_limit: f32,
    pub eye_height: f32,
    pub perspective: f32,
    anchor: Option<NodeKey>,
    controller: CameraController,
}

impl FirstPersonCamera {
    pub fn new(config: &CameraConfig, perspective: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            move_speed: config.move_speed,
            pitch_limit: config.pitch_limit,
            eye_height: config.eye_height,
            perspective,
            anchor: None,
            controller: CameraController::new(config.mouse_sensitivity),
        }
    }

    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw) * Mat4::from_rotation_x(self.pitch)
    }

    /// Camera-to-world transform.
    pub fn pose(&self) -> Mat4 {
        let eye = self.position + Vec3::new(0.0, -self.eye_height, 0.0);
        Mat4::from_translation(eye) * self.rotation()
    }
}

impl CameraRig for FirstPersonCamera {
    fn place(&mut self, anchor: NodeKey) {
        self.anchor = Some(anchor);
    }

    fn anchor(&self) -> Option<NodeKey> {
        self.anchor
    }

    fn link(&mut self) {
        self.controller.set_enabled(true);
    }

    fn unlink(&mut self) {
        self.controller.set_enabled(false);
    }

    fn is_linked(&self) -> bool {
        self.controller.is_enabled()
    }

    fn update(&mut self, dt: f32) {
        let (yaw_delta, pitch_delta) = self.controller.take_look_delta();
        self.yaw -= yaw_delta;
        self.pitch = (self.pitch - pitch_delta).clamp(-self.pitch_limit, self.pitch_limit);

        let local_move = self.controller.camera_pos_delta * self.move_speed * dt;
        // Heading only; looking up or down does not lift the camera.
        self.position += Mat4::from_rotation_y(self.yaw).transform_vector3(local_move);
    }

    fn view_transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, self.perspective)) * self.pose().inverse()
    }

    fn handle_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.controller.handle_mouse_motion(dx, dy);
    }

    fn handle_key(&mut self, code: &str, pressed: bool) {
        self.controller.handle_key(code, pressed);
    }
}
