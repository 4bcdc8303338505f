// src/main.rs

#[cfg(not(target_arch = "wasm32"))]
mod desktop;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    native::run()
}

// The browser entry point lives in the library (`platform_lib::web`).
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::Arc;
    use std::time::Instant;

    use log::info;
    use winit::{
        event::{DeviceEvent, ElementState, Event, MouseButton, WindowEvent},
        event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
        keyboard::{Key, NamedKey, PhysicalKey},
        window::WindowBuilder,
    };

    use scene3d::platform_lib::init_logging;
    use scene3d::{demo_scene, PlayState, Scene, SceneConfig, SceneEvent};

    use crate::desktop::DesktopHost;

    fn mouse_button_index(button: MouseButton) -> i16 {
        match button {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(n) => i16::try_from(n).unwrap_or(i16::MAX),
        }
    }

    /// DOM `KeyboardEvent.key` for the keys that produce a keypress.
    fn key_name(key: &Key) -> Option<String> {
        match key {
            Key::Named(NamedKey::Escape) => Some("Escape".to_string()),
            Key::Named(NamedKey::Enter) => Some("Enter".to_string()),
            Key::Named(NamedKey::Space) => Some(" ".to_string()),
            Key::Character(text) => Some(text.to_string()),
            _ => None,
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        init_logging();

        let config = match std::env::args().nth(1) {
            Some(path) => SceneConfig::load(&path)?,
            None => SceneConfig::default(),
        };

        let event_loop = EventLoop::new()?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title("scene3d - paused (click to look around)")
                .with_inner_size(winit::dpi::LogicalSize::new(1024, 768))
                .build(&event_loop)?,
        );

        let mut scene = Scene::new(DesktopHost::new(window.clone()), config)?;
        let demo = demo_scene::populate(&mut scene)?;
        info!("demo scene ready with {} tracked nodes", scene.objects().len());

        let size = window.inner_size();
        let viewport = scene.viewport();
        scene
            .host_mut()
            .inner_mut()
            .set_offset_size(viewport, f64::from(size.width), f64::from(size.height));

        let started = Instant::now();
        let mut shown_state = PlayState::Paused;

        event_loop.run(move |event, target: &EventLoopWindowTarget<()>| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == window.id() => match event {
                    WindowEvent::CloseRequested => {
                        scene.remove_avatar(demo.avatar);
                        scene.dispose();
                        target.exit();
                    }
                    WindowEvent::Resized(physical_size) => {
                        let viewport = scene.viewport();
                        scene.host_mut().inner_mut().set_offset_size(
                            viewport,
                            f64::from(physical_size.width),
                            f64::from(physical_size.height),
                        );
                    }
                    WindowEvent::Focused(false) => {
                        scene.host_mut().release_pointer_lock();
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button,
                        ..
                    } => {
                        scene.handle_event(&SceneEvent::MouseDown {
                            button: mouse_button_index(*button),
                        });
                    }
                    WindowEvent::KeyboardInput { event: key_event, .. } => {
                        let code = match key_event.physical_key {
                            PhysicalKey::Code(code) => format!("{code:?}"),
                            _ => String::new(),
                        };
                        if key_event.state == ElementState::Pressed {
                            if key_event.logical_key == Key::Named(NamedKey::Escape) {
                                scene.host_mut().release_pointer_lock();
                            }
                            scene.handle_event(&SceneEvent::KeyDown { code });
                            if let Some(key) = key_name(&key_event.logical_key) {
                                scene.handle_event(&SceneEvent::KeyPress { key });
                            }
                        } else {
                            scene.handle_event(&SceneEvent::KeyUp { code });
                        }
                    }
                    _ => {}
                },
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta: (dx, dy) },
                    ..
                } => {
                    scene.handle_event(&SceneEvent::MouseMove {
                        dx: dx as f32,
                        dy: dy as f32,
                    });
                }
                Event::AboutToWait => {
                    if scene.host_mut().take_frame_request() {
                        scene.frame(started.elapsed().as_secs_f64() * 1000.0);
                    }
                    if scene.play_state() != shown_state {
                        shown_state = scene.play_state();
                        window.set_title(&format!("scene3d - {}", shown_state.as_str()));
                    }
                }
                _ => {}
            }

            if scene.host_mut().take_lock_change() {
                scene.handle_event(&SceneEvent::PointerLockChange);
            }
        })?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn printable_keys_produce_keypress_names() {
            assert_eq!(key_name(&Key::Named(NamedKey::Space)).as_deref(), Some(" "));
            assert_eq!(key_name(&Key::Named(NamedKey::Enter)).as_deref(), Some("Enter"));
            assert_eq!(key_name(&Key::Character("w".into())).as_deref(), Some("w"));
            assert_eq!(key_name(&Key::Named(NamedKey::Shift)), None);
        }

        #[test]
        fn mouse_buttons_follow_dom_numbering() {
            assert_eq!(mouse_button_index(MouseButton::Left), 0);
            assert_eq!(mouse_button_index(MouseButton::Right), 2);
        }
    }
}
