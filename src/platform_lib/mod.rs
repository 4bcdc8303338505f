// src/platform_lib/mod.rs
//
// The hosting surface a scene draws into: element tree, listeners, pointer lock
// and animation frames. Scenes only ever talk to the platform through `Host`.

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

use slotmap::new_key_type;
use crate::error::HostError;

pub use headless::HeadlessHost;

/// Installs the platform logger: `console_log` in the browser, `env_logger`
/// elsewhere. Safe to call more than once.
pub fn init_logging() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            let _ = console_log::init_with_level(log::Level::Warn);
        } else {
            let _ = env_logger::try_init();
        }
    }
}

new_key_type! {
    /// Handle to an element owned by a host.
    pub struct ElementId;
    /// Handle to a registered event listener.
    pub struct ListenerId;
}

/// Where a listener is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    Document,
    Element(ElementId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseMove,
    PointerLockChange,
    KeyPress,
    KeyDown,
    KeyUp,
}

impl EventKind {
    /// DOM event type name.
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::MouseDown => "mousedown",
            EventKind::MouseMove => "mousemove",
            EventKind::PointerLockChange => "pointerlockchange",
            EventKind::KeyPress => "keypress",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
        }
    }
}

/// Input delivered by a host to [`Scene::handle_event`](crate::scene::Scene::handle_event).
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    MouseDown { button: i16 },
    MouseMove { dx: f32, dy: f32 },
    PointerLockChange,
    /// `key` is the DOM `KeyboardEvent.key` value, e.g. `"Escape"` or `"w"`.
    KeyPress { key: String },
    /// `code` is the DOM `KeyboardEvent.code` value, e.g. `"KeyW"`.
    KeyDown { code: String },
    KeyUp { code: String },
}

impl SceneEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SceneEvent::MouseDown { .. } => EventKind::MouseDown,
            SceneEvent::MouseMove { .. } => EventKind::MouseMove,
            SceneEvent::PointerLockChange => EventKind::PointerLockChange,
            SceneEvent::KeyPress { .. } => EventKind::KeyPress,
            SceneEvent::KeyDown { .. } => EventKind::KeyDown,
            SceneEvent::KeyUp { .. } => EventKind::KeyUp,
        }
    }
}

/// What the host should do with the platform event after dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventResponse {
    pub prevent_default: bool,
}

/// A DOM-like hosting surface.
///
/// Fallible calls return [`HostError`]; queries on unknown elements return
/// empty values instead of failing.
pub trait Host {
    /// The element new viewports are appended to.
    fn body(&self) -> ElementId;

    fn create_element(&mut self, tag: &str, class_name: &str) -> Result<ElementId, HostError>;

    /// Detaches `element` from its parent and forgets it along with its subtree.
    fn release_element(&mut self, element: ElementId);

    /// Looks up an element by DOM id. Hosts may start tracking elements they
    /// did not create.
    fn element_by_id(&mut self, id: &str) -> Option<ElementId>;

    /// Appends `child` to `parent`, moving it if it already has a parent.
    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError>;

    fn parent_of(&self, element: ElementId) -> Option<ElementId>;

    fn set_style(
        &mut self,
        element: ElementId,
        property: &str,
        value: &str,
    ) -> Result<(), HostError>;

    fn style(&self, element: ElementId, property: &str) -> Option<String>;

    fn add_class(&mut self, element: ElementId, class_name: &str) -> Result<(), HostError>;

    fn class_list(&self, element: ElementId) -> Vec<String>;

    /// Rendered `(offsetWidth, offsetHeight)`.
    fn offset_size(&self, element: ElementId) -> (f64, f64);

    fn request_pointer_lock(&mut self, element: ElementId);

    fn exit_pointer_lock(&mut self);

    fn pointer_lock_element(&self) -> Option<ElementId>;

    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<ListenerId, HostError>;

    fn unlisten(&mut self, listener: ListenerId);

    /// Schedules one call to `Scene::frame` on the next display frame.
    fn request_frame(&mut self);
}
