// src/lib.rs

pub mod config;
pub mod error;
pub mod geometry;
pub mod engine_lib;
pub mod platform_lib;
pub mod scene;
pub mod demo_scene;

pub use config::{CameraConfig, SceneConfig};
pub use engine_lib::{CameraRig, FirstPersonCamera, Node, NodeKey, NodeKind, PlayState, Transition};
pub use error::{ConfigError, HostError};
pub use platform_lib::{ElementId, EventResponse, HeadlessHost, Host, SceneEvent};
pub use scene::{Appendable, Scene};
