// src/engine_lib/mod.rs
pub mod scene_types;
pub mod camera;
pub mod controller; // Pointer and keyboard input for the camera

pub use scene_types::{Node, NodeKey, NodeKind, PlayState, Transition};
pub use camera::{CameraRig, FirstPersonCamera};
pub use controller::CameraController;
