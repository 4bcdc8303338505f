// src/platform_lib/headless.rs

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::error::HostError;
use crate::platform_lib::{ElementId, EventKind, Host, ListenTarget, ListenerId};

#[derive(Debug, Default)]
struct HeadlessElement {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    size: (f64, f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Listener {
    pub target: ListenTarget,
    pub kind: EventKind,
}

/// In-memory element tree with DOM append/remove semantics.
///
/// Nothing is dispatched on its own: callers feed events to the scene and drain
/// frame requests with [`HeadlessHost::take_frame_request`].
#[derive(Debug)]
pub struct HeadlessHost {
    elements: SlotMap<ElementId, HeadlessElement>,
    body: ElementId,
    listeners: SlotMap<ListenerId, Listener>,
    pointer_lock: Option<ElementId>,
    pointer_lock_requests: usize,
    pending_frames: usize,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let body = elements.insert(HeadlessElement {
            tag: "body".to_string(),
            ..Default::default()
        });
        Self {
            elements,
            body,
            listeners: SlotMap::with_key(),
            pointer_lock: None,
            pointer_lock_requests: 0,
            pending_frames: 0,
        }
    }

    /// Adds a `<div id=...>` under the body, e.g. as a mount point.
    pub fn insert_element_with_id(&mut self, dom_id: &str) -> ElementId {
        let element = self.elements.insert(HeadlessElement {
            tag: "div".to_string(),
            dom_id: Some(dom_id.to_string()),
            parent: Some(self.body),
            ..Default::default()
        });
        if let Some(body) = self.elements.get_mut(self.body) {
            body.children.push(element);
        }
        element
    }

    pub fn set_offset_size(&mut self, element: ElementId, width: f64, height: f64) {
        if let Some(el) = self.elements.get_mut(element) {
            el.size = (width, height);
        }
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains_key(element)
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.elements
            .get(element)
            .map(|el| el.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.elements.get(element).map(|el| el.tag.as_str())
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn listeners(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.values()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, target: ListenTarget, kind: EventKind) -> bool {
        self.listeners
            .values()
            .any(|l| l.target == target && l.kind == kind)
    }

    pub fn pointer_lock_requests(&self) -> usize {
        self.pointer_lock_requests
    }

    /// Drops pointer lock the way a user pressing Escape in a browser would.
    /// The caller still has to deliver `SceneEvent::PointerLockChange`.
    pub fn release_pointer_lock(&mut self) {
        self.pointer_lock = None;
    }

    pub fn pending_frames(&self) -> usize {
        self.pending_frames
    }

    /// Consumes one outstanding frame request, if any.
    pub fn take_frame_request(&mut self) -> bool {
        if self.pending_frames == 0 {
            return false;
        }
        self.pending_frames -= 1;
        true
    }

    fn is_ancestor(&self, ancestor: ElementId, mut element: ElementId) -> bool {
        while let Some(parent) = self.elements.get(element).and_then(|el| el.parent) {
            if parent == ancestor {
                return true;
            }
            element = parent;
        }
        false
    }

    fn detach(&mut self, element: ElementId) {
        let parent = self.elements.get_mut(element).and_then(|el| el.parent.take());
        if let Some(parent) = parent.and_then(|p| self.elements.get_mut(p)) {
            parent.children.retain(|&c| c != element);
        }
    }
}

impl Host for HeadlessHost {
    fn body(&self) -> ElementId {
        self.body
    }

    fn create_element(&mut self, tag: &str, class_name: &str) -> Result<ElementId, HostError> {
        Ok(self.elements.insert(HeadlessElement {
            tag: tag.to_string(),
            classes: class_name.split_whitespace().map(str::to_string).collect(),
            ..Default::default()
        }))
    }

    fn release_element(&mut self, element: ElementId) {
        self.detach(element);
        let mut stack = vec![element];
        while let Some(current) = stack.pop() {
            if let Some(el) = self.elements.remove(current) {
                stack.extend(el.children);
            }
            if self.pointer_lock == Some(current) {
                self.pointer_lock = None;
            }
        }
    }

    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|(_, el)| el.dom_id.as_deref() == Some(id))
            .map(|(key, _)| key)
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError> {
        if !self.elements.contains_key(parent) {
            return Err(HostError::UnknownElement(parent));
        }
        if !self.elements.contains_key(child) {
            return Err(HostError::UnknownElement(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(HostError::Platform(
                "the new child is an ancestor of the parent".to_string(),
            ));
        }
        self.detach(child);
        self.elements[child].parent = Some(parent);
        self.elements[parent].children.push(child);
        Ok(())
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), HostError> {
        match self.elements.get(child) {
            None => Err(HostError::UnknownElement(child)),
            Some(el) if el.parent != Some(parent) => Err(HostError::NotAChild { parent, child }),
            Some(_) => {
                self.detach(child);
                Ok(())
            }
        }
    }

    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        self.elements.get(element).and_then(|el| el.parent)
    }

    fn set_style(
        &mut self,
        element: ElementId,
        property: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let el = self
            .elements
            .get_mut(element)
            .ok_or(HostError::UnknownElement(element))?;
        el.style.insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.elements.get(element)?.style.get(property).cloned()
    }

    fn add_class(&mut self, element: ElementId, class_name: &str) -> Result<(), HostError> {
        let el = self
            .elements
            .get_mut(element)
            .ok_or(HostError::UnknownElement(element))?;
        if !el.classes.iter().any(|c| c == class_name) {
            el.classes.push(class_name.to_string());
        }
        Ok(())
    }

    fn class_list(&self, element: ElementId) -> Vec<String> {
        self.elements
            .get(element)
            .map(|el| el.classes.clone())
            .unwrap_or_default()
    }

    fn offset_size(&self, element: ElementId) -> (f64, f64) {
        self.elements.get(element).map(|el| el.size).unwrap_or((0.0, 0.0))
    }

    fn request_pointer_lock(&mut self, element: ElementId) {
        self.pointer_lock_requests += 1;
        if self.elements.contains_key(element) {
            self.pointer_lock = Some(element);
        }
    }

    fn exit_pointer_lock(&mut self) {
        self.pointer_lock = None;
    }

    fn pointer_lock_element(&self) -> Option<ElementId> {
        self.pointer_lock
    }

    fn listen(&mut self, target: ListenTarget, kind: EventKind) -> Result<ListenerId, HostError> {
        if let ListenTarget::Element(element) = target {
            if !self.elements.contains_key(element) {
                return Err(HostError::UnknownElement(element));
            }
        }
        Ok(self.listeners.insert(Listener { target, kind }))
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.listeners.remove(listener);
    }

    fn request_frame(&mut self) {
        self.pending_frames += 1;
    }
}
