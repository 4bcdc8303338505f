// src/platform_lib/web.rs
//
// Browser host. DOM callbacks hold a weak slot pointing back at the scene and
// dispatch synchronously, so `preventDefault` can follow the scene's answer.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;
use slotmap::{Key, KeyData, SlotMap};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::SceneConfig;
use crate::engine_lib::scene_types::NodeKey;
use crate::error::HostError;
use crate::platform_lib::{ElementId, EventKind, Host, ListenTarget, ListenerId, SceneEvent};
use crate::scene::{Appendable, Scene};

type SceneSlot = Rc<RefCell<Weak<RefCell<Scene<WebHost>>>>>;
type FrameHook = Rc<RefCell<Option<js_sys::Function>>>;

struct Registration {
    target: web_sys::EventTarget,
    kind: EventKind,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

pub struct WebHost {
    window: web_sys::Window,
    document: web_sys::Document,
    body: ElementId,
    elements: SlotMap<ElementId, web_sys::Element>,
    listeners: SlotMap<ListenerId, Registration>,
    scene: SceneSlot,
    frame_hook: FrameHook,
    frame_callback: Closure<dyn FnMut(f64)>,
    frame_handle: Option<i32>,
}

impl WebHost {
    pub fn new() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::NoDocument)?;
        let document = window.document().ok_or(HostError::NoDocument)?;
        let body: web_sys::Element = document.body().ok_or(HostError::NoDocument)?.into();

        let mut elements = SlotMap::with_key();
        let body = elements.insert(body);

        let scene: SceneSlot = Rc::new(RefCell::new(Weak::new()));
        let frame_hook: FrameHook = Rc::new(RefCell::new(None));
        let frame_scene = scene.clone();
        let hook = frame_hook.clone();
        let frame_callback = Closure::wrap(Box::new(move |timestamp: f64| {
            let live = with_scene(&frame_scene, |s| {
                s.frame(timestamp);
                !s.is_disposed()
            });
            // Runs after the scene borrow is released so the hook may call
            // back into `WebScene`.
            if live == Some(true) {
                let hook = hook.borrow().clone();
                if let Some(hook) = hook {
                    if let Err(e) = hook.call1(&JsValue::NULL, &JsValue::from_f64(timestamp)) {
                        warn!("onUpdate handler threw: {:?}", e);
                    }
                }
            }
        }) as Box<dyn FnMut(f64)>);

        Ok(Self {
            window,
            document,
            body,
            elements,
            listeners: SlotMap::with_key(),
            scene,
            frame_hook,
            frame_callback,
            frame_handle: None,
        })
    }

    /// Registers the JavaScript per-frame callback, replacing any previous one.
    pub fn set_frame_hook(&mut self, hook: Option<js_sys::Function>) {
        *self.frame_hook.borrow_mut() = hook;
    }

    /// Returns the handle for an element created outside the host, tracking
    /// it if needed.
    pub fn track(&mut self, element: web_sys::Element) -> ElementId {
        match self.key_of(&element) {
            Some(key) => key,
            None => self.elements.insert(element),
        }
    }

    fn element(&self, id: ElementId) -> Result<&web_sys::Element, HostError> {
        self.elements.get(id).ok_or(HostError::UnknownElement(id))
    }

    fn html(&self, id: ElementId) -> Result<&web_sys::HtmlElement, HostError> {
        self.element(id)?
            .dyn_ref::<web_sys::HtmlElement>()
            .ok_or_else(|| HostError::Platform("not an HTML element".to_string()))
    }

    fn key_of(&self, element: &web_sys::Element) -> Option<ElementId> {
        let node: &web_sys::Node = element;
        self.elements
            .iter()
            .find(|(_, candidate)| candidate.is_same_node(Some(node)))
            .map(|(key, _)| key)
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        for (_, registration) in self.listeners.drain() {
            let _ = registration.target.remove_event_listener_with_callback(
                registration.kind.dom_name(),
                registration.callback.as_ref().unchecked_ref(),
            );
        }
        if let Some(handle) = self.frame_handle.take() {
            let _ = self.window.cancel_animation_frame(handle);
        }
    }
}

fn with_scene<R>(slot: &SceneSlot, f: impl FnOnce(&mut Scene<WebHost>) -> R) -> Option<R> {
    let scene = slot.borrow().upgrade()?;
    let mut scene = scene.try_borrow_mut().ok()?;
    Some(f(&mut scene))
}

fn translate(kind: EventKind, event: &web_sys::Event) -> Option<SceneEvent> {
    let scene_event = match kind {
        EventKind::MouseDown => SceneEvent::MouseDown {
            button: event.dyn_ref::<web_sys::MouseEvent>()?.button(),
        },
        EventKind::MouseMove => {
            let mouse = event.dyn_ref::<web_sys::MouseEvent>()?;
            SceneEvent::MouseMove {
                dx: mouse.movement_x() as f32,
                dy: mouse.movement_y() as f32,
            }
        }
        EventKind::PointerLockChange => SceneEvent::PointerLockChange,
        EventKind::KeyPress => SceneEvent::KeyPress {
            key: event.dyn_ref::<web_sys::KeyboardEvent>()?.key(),
        },
        EventKind::KeyDown => SceneEvent::KeyDown {
            code: event.dyn_ref::<web_sys::KeyboardEvent>()?.code(),
        },
        EventKind::KeyUp => SceneEvent::KeyUp {
            code: event.dyn_ref::<web_sys::KeyboardEvent>()?.code(),
        },
    };
    Some(scene_event)
}

fn js_err(value: JsValue) -> HostError {
    HostError::Platform(format!("{value:?}"))
}

impl Host for WebHost {
    fn body(&self) -> ElementId {
        self.body
    }

    fn create_element(&mut self, tag: &str, class_name: &str) -> Result<ElementId, HostError> {
        let element = self.document.create_element(tag).map_err(js_err)?;
        element.set_class_name(class_name);
        Ok(self.elements.insert(element))
    }

    fn release_element(&mut self, element: ElementId) {
        let Some(root) = self.elements.remove(element) else {
            return;
        };
        let root_node: &web_sys::Node = &root;
        let descendants: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|(_, el)| {
                let node: &web_sys::Node = el;
                root_node.contains(Some(node))
            })
            .map(|(key, _)| key)
            .collect();
        for key in descendants {
            self.elements.remove(key);
        }
        root.remove();
    }

    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        let element = self.document.get_element_by_id(id)?;
        Some(self.track(element))
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError> {
        let parent = self.element(parent)?;
        let child = self.element(child)?;
        parent.append_child(child).map_err(js_err)?;
        Ok(())
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError> {
        let parent_el = self.element(parent)?;
        let child_el = self.element(child)?;
        let parent_node: &web_sys::Node = parent_el;
        let attached = child_el
            .parent_node()
            .is_some_and(|p| p.is_same_node(Some(parent_node)));
        if !attached {
            return Err(HostError::NotAChild { parent, child });
        }
        parent_el.remove_child(child_el).map_err(js_err)?;
        Ok(())
    }

    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.elements.get(element)?.parent_element()?;
        self.key_of(&parent)
    }

    fn set_style(
        &mut self,
        element: ElementId,
        property: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.html(element)?
            .style()
            .set_property(property, value)
            .map_err(js_err)
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.html(element)
            .ok()?
            .style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn add_class(&mut self, element: ElementId, class_name: &str) -> Result<(), HostError> {
        self.element(element)?
            .class_list()
            .add_1(class_name)
            .map_err(js_err)
    }

    fn class_list(&self, element: ElementId) -> Vec<String> {
        let Some(el) = self.elements.get(element) else {
            return Vec::new();
        };
        let list = el.class_list();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn offset_size(&self, element: ElementId) -> (f64, f64) {
        self.html(element)
            .map(|el| (f64::from(el.offset_width()), f64::from(el.offset_height())))
            .unwrap_or((0.0, 0.0))
    }

    fn request_pointer_lock(&mut self, element: ElementId) {
        if let Some(el) = self.elements.get(element) {
            el.request_pointer_lock();
        }
    }

    fn exit_pointer_lock(&mut self) {
        self.document.exit_pointer_lock();
    }

    fn pointer_lock_element(&self) -> Option<ElementId> {
        let locked = self.document.pointer_lock_element()?;
        self.key_of(&locked)
    }

    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<ListenerId, HostError> {
        let event_target: web_sys::EventTarget = match target {
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Element(id) => self.element(id)?.clone().into(),
        };
        let slot = self.scene.clone();
        let callback = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let Some(scene_event) = translate(kind, &event) else {
                return;
            };
            let response = with_scene(&slot, |s| s.handle_event(&scene_event));
            if response.is_some_and(|r| r.prevent_default) {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        event_target
            .add_event_listener_with_callback(kind.dom_name(), callback.as_ref().unchecked_ref())
            .map_err(js_err)?;
        Ok(self.listeners.insert(Registration { target: event_target, kind, callback }))
    }

    fn unlisten(&mut self, listener: ListenerId) {
        let Some(registration) = self.listeners.remove(listener) else {
            return;
        };
        if let Err(e) = registration.target.remove_event_listener_with_callback(
            registration.kind.dom_name(),
            registration.callback.as_ref().unchecked_ref(),
        ) {
            warn!("could not remove {} listener: {:?}", registration.kind.dom_name(), e);
        }
    }

    fn request_frame(&mut self) {
        match self
            .window
            .request_animation_frame(self.frame_callback.as_ref().unchecked_ref())
        {
            Ok(handle) => self.frame_handle = Some(handle),
            Err(e) => warn!("requestAnimationFrame failed: {:?}", e),
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    super::init_logging();
}

/// JavaScript-facing scene. Node handles are opaque integers.
#[wasm_bindgen]
pub struct WebScene {
    inner: Rc<RefCell<Scene<WebHost>>>,
}

fn to_handle(key: NodeKey) -> u64 {
    key.data().as_ffi()
}

fn from_handle(handle: u64) -> NodeKey {
    KeyData::from_ffi(handle).into()
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
impl WebScene {
    /// `config_toml` overrides [`SceneConfig`] defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<WebScene, JsValue> {
        let config = match config_toml {
            Some(text) => SceneConfig::from_toml_str(&text).map_err(to_js)?,
            None => SceneConfig::default(),
        };
        let host = WebHost::new().map_err(to_js)?;
        let slot = host.scene.clone();
        let inner = Rc::new(RefCell::new(Scene::new(host, config).map_err(to_js)?));
        *slot.borrow_mut() = Rc::downgrade(&inner);
        Ok(WebScene { inner })
    }

    pub fn mount(&self, parent_id: &str) {
        self.inner.borrow_mut().mount(parent_id);
    }

    #[wasm_bindgen(js_name = createPlane)]
    pub fn create_plane(
        &self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<u64, JsValue> {
        self.inner
            .borrow_mut()
            .create_plane(class_name, scale_x, scale_y)
            .map(to_handle)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = createBox)]
    pub fn create_box(
        &self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
        scale_z: f32,
    ) -> Result<u64, JsValue> {
        self.inner
            .borrow_mut()
            .create_box(class_name, scale_x, scale_y, scale_z)
            .map(to_handle)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = createRoom)]
    pub fn create_room(
        &self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
        scale_z: f32,
    ) -> Result<u64, JsValue> {
        self.inner
            .borrow_mut()
            .create_room(class_name, scale_x, scale_y, scale_z)
            .map(to_handle)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = createAvatar)]
    pub fn create_avatar(
        &self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<u64, JsValue> {
        self.inner
            .borrow_mut()
            .create_avatar(class_name, scale_x, scale_y)
            .map(to_handle)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = createEmpty)]
    pub fn create_empty(&self, class_name: &str) -> Result<u64, JsValue> {
        self.inner
            .borrow_mut()
            .create_empty(class_name)
            .map(to_handle)
            .map_err(to_js)
    }

    pub fn assemble(&self, parent: u64, child: u64) -> bool {
        self.inner
            .borrow_mut()
            .assemble(from_handle(parent), from_handle(child))
    }

    pub fn unassemble(&self, parent: u64, child: u64) -> bool {
        self.inner
            .borrow_mut()
            .unassemble(from_handle(parent), from_handle(child))
    }

    #[wasm_bindgen(js_name = removeObject)]
    pub fn remove_object(&self, node: u64) -> bool {
        self.inner.borrow_mut().remove_object(from_handle(node)).is_some()
    }

    /// Moves a node's element straight under the viewport.
    #[wasm_bindgen(js_name = appendNode)]
    pub fn append_node(&self, node: u64) {
        self.inner.borrow_mut().append(Appendable::Node(from_handle(node)));
    }

    /// Appends a caller-owned element to the viewport.
    pub fn append(&self, element: web_sys::Element) {
        let mut scene = self.inner.borrow_mut();
        let id = scene.host_mut().track(element);
        scene.append(Appendable::Element(id));
    }

    /// Called with the frame timestamp after every scene update. Pass
    /// `undefined` to clear.
    #[wasm_bindgen(js_name = onUpdate)]
    pub fn on_update(&self, handler: Option<js_sys::Function>) {
        self.inner.borrow_mut().host_mut().set_frame_hook(handler);
    }

    #[wasm_bindgen(js_name = classList)]
    pub fn class_list(&self) -> Vec<String> {
        self.inner.borrow().class_list()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.inner.borrow().style(property)
    }

    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&self, property: &str, value: &str) {
        self.inner.borrow_mut().set_style(property, value);
    }

    #[wasm_bindgen(js_name = addClass)]
    pub fn add_class(&self, class_name: &str) {
        self.inner.borrow_mut().add_class(class_name);
    }

    #[wasm_bindgen(js_name = removeAvatar)]
    pub fn remove_avatar(&self, avatar: u64) -> bool {
        self.inner.borrow_mut().remove_avatar(from_handle(avatar))
    }

    #[wasm_bindgen(js_name = setPosition)]
    pub fn set_position(&self, node: u64, x: f32, y: f32, z: f32) -> bool {
        self.inner
            .borrow_mut()
            .set_position(from_handle(node), glam::Vec3::new(x, y, z))
    }

    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&self, node: u64, x: f32, y: f32, z: f32) -> bool {
        self.inner
            .borrow_mut()
            .set_rotation(from_handle(node), glam::Vec3::new(x, y, z))
    }

    pub fn pause(&self) {
        self.inner.borrow_mut().pause();
    }

    #[wasm_bindgen(getter)]
    pub fn paused(&self) -> bool {
        self.inner.borrow().paused()
    }

    #[wasm_bindgen(setter)]
    pub fn set_paused(&self, paused: bool) {
        self.inner.borrow_mut().set_paused(paused);
    }

    #[wasm_bindgen(getter, js_name = unitValue)]
    pub fn unit_value(&self) -> f32 {
        self.inner.borrow().unit_value()
    }

    #[wasm_bindgen(setter, js_name = unitValue)]
    pub fn set_unit_value(&self, unit_value: f32) {
        self.inner.borrow_mut().set_unit_value(unit_value);
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> f64 {
        self.inner.borrow().width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> f64 {
        self.inner.borrow().height()
    }

    pub fn dispose(&self) {
        self.inner.borrow_mut().dispose();
    }
}
