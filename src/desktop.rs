// src/desktop.rs
//
// Native host for the demo binary: the headless element tree plus a winit
// window whose cursor grab plays the part of pointer lock.

use std::sync::Arc;

use log::warn;
use winit::window::{CursorGrabMode, Window};

use scene3d::platform_lib::{ElementId, EventKind, HeadlessHost, Host, ListenTarget, ListenerId};
use scene3d::HostError;

pub struct DesktopHost {
    inner: HeadlessHost,
    window: Arc<Window>,
    lock_changed: bool,
}

impl DesktopHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            inner: HeadlessHost::new(),
            window,
            lock_changed: false,
        }
    }

    pub fn inner_mut(&mut self) -> &mut HeadlessHost {
        &mut self.inner
    }

    pub fn take_frame_request(&mut self) -> bool {
        self.inner.take_frame_request()
    }

    /// True once after each grab or release; the caller then delivers
    /// `SceneEvent::PointerLockChange`.
    pub fn take_lock_change(&mut self) -> bool {
        std::mem::take(&mut self.lock_changed)
    }

    /// Releases the cursor, e.g. on focus loss or Escape.
    pub fn release_pointer_lock(&mut self) {
        if self.inner.pointer_lock_element().is_none() {
            return;
        }
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            warn!("could not ungrab cursor: {}", e);
        }
        self.window.set_cursor_visible(true);
        self.inner.release_pointer_lock();
        self.lock_changed = true;
    }
}

impl Host for DesktopHost {
    fn body(&self) -> ElementId {
        self.inner.body()
    }

    fn create_element(&mut self, tag: &str, class_name: &str) -> Result<ElementId, HostError> {
        self.inner.create_element(tag, class_name)
    }

    fn release_element(&mut self, element: ElementId) {
        self.inner.release_element(element);
    }

    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        self.inner.element_by_id(id)
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError> {
        self.inner.append_child(parent, child)
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError> {
        self.inner.remove_child(parent, child)
    }

    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        self.inner.parent_of(element)
    }

    fn set_style(
        &mut self,
        element: ElementId,
        property: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.inner.set_style(element, property, value)
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.inner.style(element, property)
    }

    fn add_class(&mut self, element: ElementId, class_name: &str) -> Result<(), HostError> {
        self.inner.add_class(element, class_name)
    }

    fn class_list(&self, element: ElementId) -> Vec<String> {
        self.inner.class_list(element)
    }

    fn offset_size(&self, element: ElementId) -> (f64, f64) {
        self.inner.offset_size(element)
    }

    fn request_pointer_lock(&mut self, element: ElementId) {
        if self.inner.pointer_lock_element() == Some(element) {
            return;
        }
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_e| self.window.set_cursor_grab(CursorGrabMode::Locked))
            .is_ok();
        if grabbed {
            self.window.set_cursor_visible(false);
            self.inner.request_pointer_lock(element);
            self.lock_changed = true;
        } else {
            warn!("could not grab cursor");
        }
    }

    fn exit_pointer_lock(&mut self) {
        self.release_pointer_lock();
    }

    fn pointer_lock_element(&self) -> Option<ElementId> {
        self.inner.pointer_lock_element()
    }

    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<ListenerId, HostError> {
        self.inner.listen(target, kind)
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.inner.unlisten(listener);
    }

    fn request_frame(&mut self) {
        self.inner.request_frame();
    }
}
