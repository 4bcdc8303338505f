// tests/scene_lifecycle.rs
use approx::assert_relative_eq;
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use scene3d::platform_lib::{EventKind, ListenTarget};
use scene3d::{HeadlessHost, Host, NodeKind, PlayState, Scene, SceneConfig, SceneEvent};

fn new_scene() -> Scene<HeadlessHost> {
    Scene::new(HeadlessHost::new(), SceneConfig::default()).unwrap()
}

#[test]
fn box_is_tracked_and_avatar_is_not() {
    let mut scene = new_scene();
    let app = scene.host_mut().insert_element_with_id("app");
    scene.mount("app");
    assert_eq!(scene.parent_node(), Some(app));

    let crate_box = scene.create_box("crate", 1.0, 1.0, 1.0).unwrap();
    let avatar = scene.create_avatar("player", 1.0, 2.0).unwrap();

    assert_eq!(scene.objects(), &[crate_box]);
    let ambient = scene.ambient();
    assert!(scene.children(ambient).contains(&crate_box));
    assert!(scene.children(ambient).contains(&avatar));

    assert!(scene.remove_avatar(avatar));
    assert!(!scene.children(ambient).contains(&avatar));
    assert_eq!(scene.objects(), &[crate_box]);
}

#[test]
fn random_creation_keeps_order_and_stamps_units() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut scene = new_scene();
    let mut expected = Vec::new();

    for _ in 0..64 {
        let unit = rng.gen_range(1..100) as f32;
        scene.set_unit_value(unit);
        let (key, kind) = match rng.gen_range(0..4) {
            0 => (scene.create_plane("p", 1.0, 2.0).unwrap(), NodeKind::Plane),
            1 => (scene.create_box("b", 1.0, 2.0, 3.0).unwrap(), NodeKind::Box),
            2 => (scene.create_room("r", 4.0, 2.0, 4.0).unwrap(), NodeKind::Room),
            _ => (scene.create_avatar("a", 1.0, 2.0).unwrap(), NodeKind::Avatar),
        };
        let node = scene.node(key).unwrap();
        assert_eq!(node.kind, kind);
        assert_eq!(node.unit_value, unit);
        if kind != NodeKind::Avatar {
            expected.push(key);
        }
    }

    assert_eq!(scene.objects(), expected.as_slice());
}

#[test]
fn input_drives_the_camera_until_lock_is_lost() {
    let mut scene = new_scene();
    scene.frame(0.0);

    // Paused: movement keys are ignored.
    scene.handle_event(&SceneEvent::KeyDown { code: "KeyW".to_string() });
    scene.frame(500.0);
    assert_eq!(scene.camera().position, Vec3::ZERO);

    scene.handle_event(&SceneEvent::MouseDown { button: 0 });
    assert_eq!(scene.play_state(), PlayState::Running);
    scene.handle_event(&SceneEvent::KeyDown { code: "KeyW".to_string() });
    scene.frame(1000.0);
    assert_relative_eq!(scene.camera().position.z, -120.0, epsilon = 1e-3);

    scene.host_mut().release_pointer_lock();
    scene.handle_event(&SceneEvent::PointerLockChange);
    assert!(scene.paused());

    let parked = scene.camera().position;
    scene.handle_event(&SceneEvent::KeyDown { code: "KeyD".to_string() });
    scene.handle_event(&SceneEvent::MouseMove { dx: 40.0, dy: 10.0 });
    scene.frame(1500.0);
    assert_eq!(scene.camera().position, parked);
    assert_eq!(scene.camera().yaw, 0.0);
}

#[test]
fn dispose_unregisters_every_listener() {
    let mut scene = new_scene();
    let viewport = scene.viewport();
    assert!(scene.host().is_listening(ListenTarget::Element(viewport), EventKind::MouseDown));
    assert_eq!(scene.host().listener_count(), 6);

    scene.dispose();
    assert_eq!(scene.host().listener_count(), 0);
    assert_eq!(scene.host().parent_of(viewport), None);
}
