// src/engine_lib/scene_types.rs
use glam::{Mat4, Vec3};
use slotmap::new_key_type;

use crate::geometry::node_transform;
use crate::platform_lib::ElementId;

new_key_type! {
    /// Stable handle to a node in a scene's arena.
    pub struct NodeKey;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Empty,
    Plane,
    Box,
    Room,
    Avatar,
}

impl NodeKind {
    /// Class added to every node element of this kind.
    pub fn css_class(self) -> &'static str {
        match self {
            NodeKind::Empty => "scene-empty",
            NodeKind::Plane => "scene-plane",
            NodeKind::Box => "scene-box",
            NodeKind::Room => "scene-room",
            NodeKind::Avatar => "scene-avatar",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlayState {
    #[default]
    Paused,
    Running,
}

impl PlayState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayState::Paused => "paused",
            PlayState::Running => "running",
        }
    }
}

/// Result of a play-state assignment. `from == to` when nothing changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: PlayState,
    pub to: PlayState,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub class_name: String,
    pub scale: Vec3,
    /// Scene unit at creation time.
    pub unit_value: f32,
    pub position: Vec3,
    /// Euler angles in radians, applied Y then X then Z.
    pub rotation: Vec3,
    pub element: ElementId,
    pub faces: Vec<ElementId>,
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
    pub(crate) dirty: bool,
}

impl Node {
    pub(crate) fn new(
        kind: NodeKind,
        class_name: &str,
        scale: Vec3,
        unit_value: f32,
        element: ElementId,
    ) -> Self {
        Self {
            kind,
            class_name: class_name.to_string(),
            scale,
            unit_value,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            element,
            faces: Vec::new(),
            parent: None,
            children: Vec::new(),
            dirty: true,
        }
    }

    pub fn transform(&self) -> Mat4 {
        node_transform(self.position, self.rotation, self.unit_value)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
