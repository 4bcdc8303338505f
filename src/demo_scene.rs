// src/demo_scene.rs

use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

use crate::engine_lib::camera::CameraRig;
use crate::engine_lib::scene_types::NodeKey;
use crate::error::HostError;
use crate::platform_lib::Host;
use crate::scene::Scene;

const UNIT: f32 = 50.0;
const ROOM_SIZE: Vec3 = Vec3::new(12.0, 4.0, 12.0);

pub struct DemoNodes {
    pub room: NodeKey,
    pub floor: NodeKey,
    pub crates: Vec<NodeKey>,
    pub avatar: NodeKey,
}

/// A room with a floor, a few crates and an avatar standing near the back wall.
pub fn populate<H: Host, C: CameraRig>(scene: &mut Scene<H, C>) -> Result<DemoNodes, HostError> {
    scene.set_unit_value(UNIT);

    let room = scene.create_room("demo-room", ROOM_SIZE.x, ROOM_SIZE.y, ROOM_SIZE.z)?;

    let floor = scene.create_plane("demo-floor", ROOM_SIZE.x, ROOM_SIZE.z)?;
    scene.set_rotation(floor, Vec3::new(FRAC_PI_2, 0.0, 0.0));
    scene.set_position(floor, Vec3::new(0.0, ROOM_SIZE.y / 2.0 - 0.01, 0.0));

    let crate_spots = [
        Vec3::new(-3.0, 1.5, -3.0),
        Vec3::new(2.5, 1.5, -4.0),
        Vec3::new(3.5, 1.5, 2.0),
    ];
    let mut crates = Vec::with_capacity(crate_spots.len());
    for (i, spot) in crate_spots.into_iter().enumerate() {
        let key = scene.create_box("demo-crate", 1.0, 1.0, 1.0)?;
        scene.set_position(key, spot);
        scene.set_rotation(key, Vec3::new(0.0, 0.3 * i as f32, 0.0));
        crates.push(key);
    }

    let avatar = scene.create_avatar("demo-avatar", 1.0, 2.0)?;
    scene.set_position(avatar, Vec3::new(0.0, 1.0, -5.0));

    Ok(DemoNodes { room, floor, crates, avatar })
}
