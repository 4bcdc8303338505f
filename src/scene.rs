// src/scene.rs

use glam::Vec3;
use log::{debug, info, warn};
use slotmap::SlotMap;

use crate::config::SceneConfig;
use crate::engine_lib::camera::{CameraRig, FirstPersonCamera};
use crate::engine_lib::scene_types::{Node, NodeKey, NodeKind, PlayState, Transition};
use crate::error::HostError;
use crate::geometry::{css_matrix3d, css_px, face_layouts};
use crate::platform_lib::{
    ElementId, EventKind, EventResponse, Host, ListenTarget, ListenerId, SceneEvent,
};

/// Something that can be appended straight to the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Appendable {
    Element(ElementId),
    Node(NodeKey),
}

/// Owns a viewport element, the node arena rooted at the ambient node, and the
/// camera. Input arrives through [`Scene::handle_event`]; the host drives
/// [`Scene::frame`] once per requested animation frame.
pub struct Scene<H: Host, C: CameraRig = FirstPersonCamera> {
    host: H,
    config: SceneConfig,
    play_state: PlayState,
    unit_value: f32,
    viewport: ElementId,
    nodes: SlotMap<NodeKey, Node>,
    ambient: NodeKey,
    camera: C,
    objects: Vec<NodeKey>,
    parent_node: Option<ElementId>,
    on_update: Option<Box<dyn FnMut()>>,
    listeners: Vec<ListenerId>,
    last_frame_ms: Option<f64>,
    disposed: bool,
}

impl<H: Host> Scene<H, FirstPersonCamera> {
    pub fn new(host: H, config: SceneConfig) -> Result<Self, HostError> {
        let camera = FirstPersonCamera::new(&config.camera, config.perspective);
        Self::with_camera(host, config, camera)
    }
}

impl<H: Host, C: CameraRig> Scene<H, C> {
    /// Builds the viewport and ambient root, starts listening and requests the
    /// first frame. Fails only if the host cannot create elements.
    pub fn with_camera(
        mut host: H,
        config: SceneConfig,
        mut camera: C,
    ) -> Result<Self, HostError> {
        let viewport = create_viewport(&mut host, &config)?;

        let ambient_element = host.create_element("div", &config.ambient_class)?;
        for (property, value) in [
            ("position", "absolute"),
            ("left", "50%"),
            ("top", "50%"),
            ("transform-style", "preserve-3d"),
        ] {
            warn_on_err(host.set_style(ambient_element, property, value), "style ambient");
        }
        warn_on_err(host.append_child(viewport, ambient_element), "attach ambient");

        let mut nodes = SlotMap::with_key();
        let ambient = nodes.insert(Node::new(
            NodeKind::Empty,
            &config.ambient_class,
            Vec3::ONE,
            config.unit_value,
            ambient_element,
        ));
        camera.place(ambient);

        let mut scene = Self {
            host,
            unit_value: config.unit_value,
            config,
            play_state: PlayState::Paused,
            viewport,
            nodes,
            ambient,
            camera,
            objects: Vec::new(),
            parent_node: None,
            on_update: None,
            listeners: Vec::new(),
            last_frame_ms: None,
            disposed: false,
        };
        scene.set_paused(true);
        scene.attach_listeners();
        scene.host.request_frame();
        Ok(scene)
    }

    fn attach_listeners(&mut self) {
        let wanted = [
            (ListenTarget::Element(self.viewport), EventKind::MouseDown),
            (ListenTarget::Document, EventKind::PointerLockChange),
            (ListenTarget::Document, EventKind::KeyPress),
            (ListenTarget::Document, EventKind::MouseMove),
            (ListenTarget::Document, EventKind::KeyDown),
            (ListenTarget::Document, EventKind::KeyUp),
        ];
        for (target, kind) in wanted {
            match self.host.listen(target, kind) {
                Ok(id) => self.listeners.push(id),
                Err(e) => warn!("could not listen for {}: {}", kind.dom_name(), e),
            }
        }
    }

    /// One render-loop tick: camera, dirty nodes, user callback, next frame.
    pub fn frame(&mut self, timestamp_ms: f64) {
        if self.disposed {
            return;
        }
        let dt = self
            .last_frame_ms
            .map(|last| ((timestamp_ms - last) / 1000.0).max(0.0) as f32)
            .unwrap_or(0.0);
        self.last_frame_ms = Some(timestamp_ms);

        self.camera.update(dt);
        let anchor = self.camera.anchor();
        if let Some(node) = anchor.and_then(|key| self.nodes.get_mut(key)) {
            let transform = css_matrix3d(&self.camera.view_transform());
            let result = self.host.set_style(node.element, "transform", &transform);
            warn_on_err(result, "camera transform");
            node.dirty = false;
        }

        for (key, node) in self.nodes.iter_mut() {
            if !node.dirty || Some(key) == anchor {
                continue;
            }
            let transform = css_matrix3d(&node.transform());
            let result = self.host.set_style(node.element, "transform", &transform);
            warn_on_err(result, "node transform");
            node.dirty = false;
        }

        if let Some(handler) = self.on_update.as_mut() {
            handler();
        }
        self.host.request_frame();
    }

    /// Registers the per-frame callback, replacing any previous one.
    pub fn on_update(&mut self, handler: impl FnMut() + 'static) {
        self.on_update = Some(Box::new(handler));
    }

    pub fn create_plane(
        &mut self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<NodeKey, HostError> {
        self.create_tracked(NodeKind::Plane, class_name, Vec3::new(scale_x, scale_y, 0.0))
    }

    pub fn create_box(
        &mut self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
        scale_z: f32,
    ) -> Result<NodeKey, HostError> {
        self.create_tracked(NodeKind::Box, class_name, Vec3::new(scale_x, scale_y, scale_z))
    }

    pub fn create_room(
        &mut self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
        scale_z: f32,
    ) -> Result<NodeKey, HostError> {
        self.create_tracked(NodeKind::Room, class_name, Vec3::new(scale_x, scale_y, scale_z))
    }

    /// Empty grouping node; tracked like the other primitives.
    pub fn create_empty(&mut self, class_name: &str) -> Result<NodeKey, HostError> {
        self.create_tracked(NodeKind::Empty, class_name, Vec3::ONE)
    }

    /// Avatars are attached under the ambient root but never tracked in
    /// [`Scene::objects`]; remove them with [`Scene::remove_avatar`].
    pub fn create_avatar(
        &mut self,
        class_name: &str,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<NodeKey, HostError> {
        let scale = Vec3::new(scale_x, scale_y, 0.0);
        let avatar = self.create_node(NodeKind::Avatar, class_name, scale)?;
        self.assemble(self.ambient, avatar);
        Ok(avatar)
    }

    fn create_tracked(
        &mut self,
        kind: NodeKind,
        class_name: &str,
        scale: Vec3,
    ) -> Result<NodeKey, HostError> {
        let key = self.create_node(kind, class_name, scale)?;
        self.objects.push(key);
        self.assemble(self.ambient, key);
        Ok(key)
    }

    fn create_node(
        &mut self,
        kind: NodeKind,
        class_name: &str,
        scale: Vec3,
    ) -> Result<NodeKey, HostError> {
        let unit = self.unit_value;
        let element = self
            .host
            .create_element("div", &format!("{} {}", kind.css_class(), class_name))?;
        warn_on_err(self.host.set_style(element, "position", "absolute"), "style node");
        warn_on_err(self.host.set_style(element, "transform-style", "preserve-3d"), "style node");

        let mut node = Node::new(kind, class_name, scale, unit, element);
        for face in face_layouts(kind, scale, unit) {
            let face_class = format!("face {}", face.name);
            let face_element = match self.host.create_element("div", &face_class) {
                Ok(el) => el,
                Err(e) => {
                    self.host.release_element(element);
                    return Err(e);
                }
            };
            let styles = [
                ("position", "absolute".to_string()),
                ("width", css_px(face.width)),
                ("height", css_px(face.height)),
                ("margin-left", css_px(-face.width / 2.0)),
                ("margin-top", css_px(-face.height / 2.0)),
                ("backface-visibility", "hidden".to_string()),
                ("transform", css_matrix3d(&face.transform)),
            ];
            for (property, value) in &styles {
                warn_on_err(self.host.set_style(face_element, property, value), "style face");
            }
            warn_on_err(self.host.append_child(element, face_element), "attach face");
            node.faces.push(face_element);
        }

        let key = self.nodes.insert(node);
        debug!("created {:?} '{}' at unit {}", kind, class_name, unit);
        Ok(key)
    }

    /// Attaches `child` under `parent`, moving it from any previous parent.
    /// Returns `false` for stale keys or when the move would create a cycle.
    pub fn assemble(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            debug!("assemble ignored: stale node key");
            return false;
        }
        if parent == child || self.is_ancestor(child, parent) {
            debug!("assemble ignored: would create a cycle");
            return false;
        }
        if let Some(old_parent) = self.nodes[child].parent {
            self.nodes[old_parent].children.retain(|&c| c != child);
        }
        let parent_element = self.nodes[parent].element;
        let child_element = self.nodes[child].element;
        warn_on_err(self.host.append_child(parent_element, child_element), "assemble");
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }

    /// Detaches `child` from `parent`. Not-attached children are a silent no-op.
    pub fn unassemble(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        let attached = self
            .nodes
            .get(child)
            .is_some_and(|node| node.parent == Some(parent));
        if !attached {
            debug!("unassemble ignored: node is not a child of the given parent");
            return false;
        }
        let parent_element = self.nodes[parent].element;
        let child_element = self.nodes[child].element;
        warn_on_err(self.host.remove_child(parent_element, child_element), "unassemble");
        self.nodes[parent].children.retain(|&c| c != child);
        self.nodes[child].parent = None;
        true
    }

    fn is_ancestor(&self, ancestor: NodeKey, mut node: NodeKey) -> bool {
        while let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Detaches an avatar from its parent (normally the ambient root) and
    /// destroys it. Unknown keys and non-avatar nodes are ignored.
    pub fn remove_avatar(&mut self, avatar: NodeKey) -> bool {
        let parent = match self.nodes.get(avatar) {
            Some(node) if node.kind == NodeKind::Avatar => node.parent,
            _ => {
                debug!("remove_avatar ignored: not a live avatar");
                return false;
            }
        };
        if let Some(parent) = parent {
            self.unassemble(parent, avatar);
        }
        self.destroy_subtree(avatar).is_some()
    }

    /// Removes a tracked node, its descendants and their elements.
    pub fn remove_object(&mut self, key: NodeKey) -> Option<Node> {
        if key == self.ambient || !self.objects.contains(&key) {
            debug!("remove_object ignored: node is not tracked");
            return None;
        }
        if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
            self.unassemble(parent, key);
        }
        self.destroy_subtree(key)
    }

    fn destroy_subtree(&mut self, root: NodeKey) -> Option<Node> {
        let removed = self.nodes.remove(root)?;
        let mut stack = removed.children.clone();
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.remove(key) {
                stack.extend(node.children);
            }
        }
        self.objects.retain(|k| self.nodes.contains_key(*k));
        self.host.release_element(removed.element);
        Some(removed)
    }

    /// Appends an element, or a node's element, directly to the viewport.
    /// A node appended this way leaves its graph parent and is no longer
    /// moved by the camera.
    pub fn append(&mut self, child: Appendable) -> Appendable {
        let element = match child {
            Appendable::Element(element) => Some(element),
            Appendable::Node(key) if key == self.ambient => None,
            Appendable::Node(key) => {
                if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
                    self.nodes[parent].children.retain(|&c| c != key);
                    self.nodes[key].parent = None;
                }
                self.nodes.get(key).map(|n| n.element)
            }
        };
        if let Some(element) = element {
            warn_on_err(self.host.append_child(self.viewport, element), "append to viewport");
        }
        child
    }

    /// Moves the viewport under the element with DOM id `parent_id`.
    /// A missing element leaves everything unchanged.
    pub fn mount(&mut self, parent_id: &str) {
        let Some(parent) = self.host.element_by_id(parent_id) else {
            debug!("mount target '{}' not found", parent_id);
            return;
        };
        match self.host.append_child(parent, self.viewport) {
            Ok(()) => {
                self.parent_node = Some(parent);
                info!("scene mounted into '{}'", parent_id);
            }
            Err(e) => warn!("could not mount scene into '{}': {}", parent_id, e),
        }
    }

    /// Assigns the play state. The camera is linked or unlinked on every call,
    /// whether or not the state changes.
    pub fn set_paused(&mut self, paused: bool) -> Transition {
        let from = self.play_state;
        if paused {
            self.play_state = PlayState::Paused;
            self.camera.unlink();
        } else {
            self.play_state = PlayState::Running;
            self.camera.link();
        }
        let transition = Transition { from, to: self.play_state };
        if transition.changed() {
            debug!("scene {} -> {}", from.as_str(), self.play_state.as_str());
        }
        transition
    }

    pub fn pause(&mut self) -> Transition {
        self.set_paused(true)
    }

    pub fn paused(&self) -> bool {
        self.play_state == PlayState::Paused
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn handle_event(&mut self, event: &SceneEvent) -> EventResponse {
        let mut response = EventResponse::default();
        if self.disposed {
            return response;
        }
        match event {
            SceneEvent::MouseDown { .. } => {
                self.host.request_pointer_lock(self.viewport);
                self.set_paused(false);
            }
            SceneEvent::PointerLockChange => {
                if self.host.pointer_lock_element() != Some(self.viewport) {
                    self.set_paused(true);
                }
            }
            SceneEvent::KeyPress { key } => {
                response.prevent_default = self.paused();
                if self.config.escape_pauses && key.eq_ignore_ascii_case("escape") {
                    self.set_paused(true);
                }
            }
            SceneEvent::MouseMove { dx, dy } => self.camera.handle_mouse_motion(*dx, *dy),
            SceneEvent::KeyDown { code } => self.camera.handle_key(code, true),
            SceneEvent::KeyUp { code } => self.camera.handle_key(code, false),
        }
        response
    }

    /// Removes listeners, releases pointer lock, unmounts the viewport and stops
    /// the render loop. Later events and frames are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for listener in self.listeners.drain(..) {
            self.host.unlisten(listener);
        }
        self.set_paused(true);
        if self.host.pointer_lock_element() == Some(self.viewport) {
            self.host.exit_pointer_lock();
        }
        if let Some(parent) = self.host.parent_of(self.viewport) {
            warn_on_err(self.host.remove_child(parent, self.viewport), "unmount viewport");
        }
        self.parent_node = None;
        self.disposed = true;
        info!("scene disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn class_list(&self) -> Vec<String> {
        self.host.class_list(self.viewport)
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.host.style(self.viewport, property)
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        warn_on_err(self.host.set_style(self.viewport, property, value), "viewport style");
    }

    pub fn add_class(&mut self, class_name: &str) {
        warn_on_err(self.host.add_class(self.viewport, class_name), "viewport class");
    }

    pub fn width(&self) -> f64 {
        self.host.offset_size(self.viewport).0
    }

    pub fn height(&self) -> f64 {
        self.host.offset_size(self.viewport).1
    }

    pub fn unit_value(&self) -> f32 {
        self.unit_value
    }

    /// Affects nodes created afterwards only.
    pub fn set_unit_value(&mut self, unit_value: f32) {
        self.unit_value = unit_value;
    }

    /// Tracked nodes in creation order. Avatars are never listed.
    pub fn objects(&self) -> &[NodeKey] {
        &self.objects
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable access; the node's transform is rewritten on the next frame.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        let node = self.nodes.get_mut(key)?;
        node.dirty = true;
        Some(node)
    }

    pub fn set_position(&mut self, key: NodeKey, position: Vec3) -> bool {
        self.node_mut(key).map(|node| node.position = position).is_some()
    }

    pub fn set_rotation(&mut self, key: NodeKey, rotation: Vec3) -> bool {
        self.node_mut(key).map(|node| node.rotation = rotation).is_some()
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn ambient(&self) -> NodeKey {
        self.ambient
    }

    pub fn viewport(&self) -> ElementId {
        self.viewport
    }

    pub fn parent_node(&self) -> Option<ElementId> {
        self.parent_node
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

fn create_viewport<H: Host>(host: &mut H, config: &SceneConfig) -> Result<ElementId, HostError> {
    let viewport = host.create_element("div", &config.viewport_class)?;
    let perspective = css_px(config.perspective);
    for (property, value) in [
        ("position", "relative"),
        ("width", "100%"),
        ("height", "100%"),
        ("overflow", "hidden"),
        ("perspective", perspective.as_str()),
    ] {
        warn_on_err(host.set_style(viewport, property, value), "style viewport");
    }
    let body = host.body();
    warn_on_err(host.append_child(body, viewport), "attach viewport");
    Ok(viewport)
}

fn warn_on_err(result: Result<(), HostError>, what: &str) {
    if let Err(e) = result {
        warn!("{} failed: {}", what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_lib::HeadlessHost;
    use glam::Mat4;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingCamera {
        anchor: Option<NodeKey>,
        linked: bool,
        links: usize,
        unlinks: usize,
        updates: Vec<f32>,
        keys: Vec<(String, bool)>,
    }

    impl CameraRig for RecordingCamera {
        fn place(&mut self, anchor: NodeKey) {
            self.anchor = Some(anchor);
        }

        fn anchor(&self) -> Option<NodeKey> {
            self.anchor
        }

        fn link(&mut self) {
            self.linked = true;
            self.links += 1;
        }

        fn unlink(&mut self) {
            self.linked = false;
            self.unlinks += 1;
        }

        fn is_linked(&self) -> bool {
            self.linked
        }

        fn update(&mut self, dt: f32) {
            self.updates.push(dt);
        }

        fn view_transform(&self) -> Mat4 {
            Mat4::IDENTITY
        }

        fn handle_key(&mut self, code: &str, pressed: bool) {
            self.keys.push((code.to_string(), pressed));
        }
    }

    fn scene() -> Scene<HeadlessHost, RecordingCamera> {
        let camera = RecordingCamera::default();
        Scene::with_camera(HeadlessHost::new(), SceneConfig::default(), camera).unwrap()
    }

    #[test]
    fn construction_builds_viewport_and_starts_paused() {
        let scene = scene();
        let host = scene.host();

        assert_eq!(scene.play_state(), PlayState::Paused);
        assert_eq!(scene.camera().unlinks, 1);
        assert_eq!(scene.camera().links, 0);
        assert_eq!(scene.camera().anchor, Some(scene.ambient()));
        assert_eq!(host.parent_of(scene.viewport()), Some(host.body()));
        let ambient_element = scene.node(scene.ambient()).unwrap().element;
        assert_eq!(host.parent_of(ambient_element), Some(scene.viewport()));
        assert_eq!(scene.style("overflow").as_deref(), Some("hidden"));
        assert_eq!(scene.style("perspective").as_deref(), Some("600px"));
        assert_eq!(host.pending_frames(), 1);
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn construction_installs_scoped_listeners() {
        let scene = scene();
        let host = scene.host();
        assert!(host.is_listening(ListenTarget::Element(scene.viewport()), EventKind::MouseDown));
        assert!(host.is_listening(ListenTarget::Document, EventKind::PointerLockChange));
        assert!(host.is_listening(ListenTarget::Document, EventKind::KeyPress));
        assert!(!host.is_listening(ListenTarget::Document, EventKind::MouseDown));
    }

    #[test]
    fn unit_value_is_stamped_at_creation_only() {
        let mut scene = scene();
        scene.set_unit_value(2.0);
        let boxed = scene.create_box("b", 1.0, 1.0, 1.0).unwrap();
        scene.set_unit_value(5.0);
        let plane = scene.create_plane("p", 3.0, 4.0).unwrap();
        let room = scene.create_room("r", 1.0, 1.0, 1.0).unwrap();

        assert_eq!(scene.node(boxed).unwrap().unit_value, 2.0);
        assert_eq!(scene.node(plane).unwrap().unit_value, 5.0);
        assert_eq!(scene.node(room).unwrap().unit_value, 5.0);

        let face = scene.node(plane).unwrap().faces[0];
        assert_eq!(scene.host().style(face, "width").as_deref(), Some("15px"));
    }

    #[test]
    fn avatars_are_not_tracked() {
        let mut scene = scene();
        let a = scene.create_box("a", 1.0, 1.0, 1.0).unwrap();
        let avatar = scene.create_avatar("me", 1.0, 2.0).unwrap();
        let b = scene.create_plane("b", 1.0, 1.0).unwrap();
        let c = scene.create_room("c", 1.0, 1.0, 1.0).unwrap();

        assert_eq!(scene.objects(), &[a, b, c]);
        assert!(!scene.objects().contains(&avatar));
        assert!(scene.children(scene.ambient()).contains(&avatar));
    }

    #[test]
    fn every_assignment_touches_the_camera() {
        let mut scene = scene();
        for _ in 0..2 {
            scene.set_paused(true);
            scene.set_paused(false);
        }
        assert_eq!(scene.play_state(), PlayState::Running);
        assert_eq!(scene.camera().links, 2);
        // One from construction.
        assert_eq!(scene.camera().unlinks, 3);

        let repeat = scene.set_paused(false);
        assert!(!repeat.changed());
        assert_eq!(scene.camera().links, 3);
    }

    #[test]
    fn transitions_report_both_states() {
        let mut scene = scene();
        let t = scene.set_paused(false);
        assert_eq!(t, Transition { from: PlayState::Paused, to: PlayState::Running });
        let t = scene.pause();
        assert_eq!(t, Transition { from: PlayState::Running, to: PlayState::Paused });
        assert!(scene.paused());
    }

    #[test]
    fn mousedown_requests_lock_and_runs() {
        let mut scene = scene();
        scene.handle_event(&SceneEvent::MouseDown { button: 0 });
        assert_eq!(scene.play_state(), PlayState::Running);
        assert!(scene.camera().linked);
        assert_eq!(scene.host().pointer_lock_requests(), 1);
        assert_eq!(scene.host().pointer_lock_element(), Some(scene.viewport()));
    }

    #[test]
    fn losing_pointer_lock_pauses() {
        let mut scene = scene();
        scene.handle_event(&SceneEvent::MouseDown { button: 0 });
        scene.handle_event(&SceneEvent::PointerLockChange);
        assert_eq!(scene.play_state(), PlayState::Running);

        scene.host_mut().release_pointer_lock();
        scene.handle_event(&SceneEvent::PointerLockChange);
        assert_eq!(scene.play_state(), PlayState::Paused);

        scene.handle_event(&SceneEvent::PointerLockChange);
        assert_eq!(scene.play_state(), PlayState::Paused);
    }

    #[test]
    fn lock_on_another_element_pauses() {
        let mut scene = scene();
        scene.set_paused(false);
        let other = scene.host_mut().insert_element_with_id("other");
        scene.host_mut().request_pointer_lock(other);
        scene.handle_event(&SceneEvent::PointerLockChange);
        assert!(scene.paused());
    }

    #[test]
    fn keypress_default_is_suppressed_only_while_paused() {
        let mut scene = scene();
        let key = SceneEvent::KeyPress { key: "w".to_string() };
        assert!(scene.handle_event(&key).prevent_default);
        scene.set_paused(false);
        assert!(!scene.handle_event(&key).prevent_default);
    }

    #[test]
    fn escape_keypress_pauses() {
        let mut scene = scene();
        scene.set_paused(false);
        let response = scene.handle_event(&SceneEvent::KeyPress { key: "Escape".to_string() });
        assert!(!response.prevent_default);
        assert!(scene.paused());
    }

    #[test]
    fn escape_can_be_left_inert() {
        // Earlier releases lowercased the key and compared it with "Escape",
        // so Escape never paused. `escape_pauses = false` keeps that behaviour.
        let config = SceneConfig { escape_pauses: false, ..SceneConfig::default() };
        let mut scene =
            Scene::with_camera(HeadlessHost::new(), config, RecordingCamera::default()).unwrap();
        scene.set_paused(false);
        scene.handle_event(&SceneEvent::KeyPress { key: "Escape".to_string() });
        assert_eq!(scene.play_state(), PlayState::Running);
    }

    #[test]
    fn movement_keys_reach_the_camera() {
        let mut scene = scene();
        scene.handle_event(&SceneEvent::KeyDown { code: "KeyW".to_string() });
        scene.handle_event(&SceneEvent::KeyUp { code: "KeyW".to_string() });
        assert_eq!(
            scene.camera().keys,
            vec![("KeyW".to_string(), true), ("KeyW".to_string(), false)]
        );
    }

    #[test]
    fn mount_to_missing_parent_is_a_noop() {
        let mut scene = scene();
        scene.mount("missing-id");
        assert_eq!(scene.parent_node(), None);
        assert_eq!(scene.host().parent_of(scene.viewport()), Some(scene.host().body()));
    }

    #[test]
    fn mount_moves_viewport_under_parent() {
        let mut scene = scene();
        let app = scene.host_mut().insert_element_with_id("app");
        scene.mount("app");
        assert_eq!(scene.parent_node(), Some(app));
        assert_eq!(scene.host().children(app), &[scene.viewport()]);
        assert!(!scene.host().children(scene.host().body()).contains(&scene.viewport()));
    }

    #[test]
    fn remove_avatar_detaches_and_destroys() {
        let mut scene = scene();
        let avatar = scene.create_avatar("a", 1.0, 1.0).unwrap();
        let element = scene.node(avatar).unwrap().element;

        assert!(scene.remove_avatar(avatar));
        assert!(!scene.children(scene.ambient()).contains(&avatar));
        assert!(scene.node(avatar).is_none());
        assert!(!scene.host().contains(element));

        assert!(!scene.remove_avatar(avatar));
    }

    #[test]
    fn remove_avatar_detaches_from_its_actual_parent() {
        let mut scene = scene();
        let group = scene.create_box("g", 1.0, 1.0, 1.0).unwrap();
        let avatar = scene.create_avatar("a", 1.0, 1.0).unwrap();
        assert!(scene.assemble(group, avatar));

        assert!(scene.remove_avatar(avatar));
        assert!(scene.node(avatar).is_none());
        assert!(scene.children(group).is_empty());
        let group_element = scene.node(group).unwrap().element;
        assert_eq!(scene.host().children(group_element).len(), 6);
    }

    #[test]
    fn remove_avatar_ignores_other_kinds() {
        let mut scene = scene();
        let boxed = scene.create_box("b", 1.0, 1.0, 1.0).unwrap();
        assert!(!scene.remove_avatar(boxed));
        assert!(scene.node(boxed).is_some());
    }

    #[test]
    fn remove_object_drops_node_and_descendants() {
        let mut scene = scene();
        let group = scene.create_empty("group").unwrap();
        let inner = scene.create_box("inner", 1.0, 1.0, 1.0).unwrap();
        let keep = scene.create_plane("keep", 1.0, 1.0).unwrap();
        assert!(scene.assemble(group, inner));

        let removed = scene.remove_object(group).unwrap();
        assert_eq!(removed.kind, NodeKind::Empty);
        assert_eq!(scene.objects(), &[keep]);
        assert!(scene.node(inner).is_none());
        assert!(scene.remove_object(scene.ambient()).is_none());
    }

    #[test]
    fn assemble_rejects_cycles() {
        let mut scene = scene();
        let outer = scene.create_empty("outer").unwrap();
        let inner = scene.create_empty("inner").unwrap();
        assert!(scene.assemble(outer, inner));
        assert!(!scene.assemble(inner, outer));
        assert!(!scene.unassemble(scene.ambient(), inner));
        assert!(scene.unassemble(outer, inner));
    }

    #[test]
    fn frames_update_camera_then_call_back() {
        let mut scene = scene();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let counter = first.clone();
        scene.on_update(move || counter.set(counter.get() + 1));
        scene.frame(1000.0);
        let counter = second.clone();
        scene.on_update(move || counter.set(counter.get() + 1));
        scene.frame(1016.0);
        scene.frame(1032.0);

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert_eq!(scene.camera().updates.len(), 3);
        assert_eq!(scene.camera().updates[0], 0.0);
        assert!((scene.camera().updates[1] - 0.016).abs() < 1e-6);
        assert_eq!(scene.host().pending_frames(), 4);
    }

    #[test]
    fn frames_keep_running_while_paused() {
        let mut scene = scene();
        scene.frame(0.0);
        scene.frame(16.0);
        assert!(scene.paused());
        assert_eq!(scene.camera().updates.len(), 2);
    }

    #[test]
    fn dirty_nodes_are_written_on_next_frame() {
        let mut scene = scene();
        scene.set_unit_value(10.0);
        let boxed = scene.create_box("b", 1.0, 1.0, 1.0).unwrap();
        scene.frame(0.0);
        assert!(!scene.node(boxed).unwrap().is_dirty());

        scene.set_position(boxed, Vec3::new(1.0, 2.0, 3.0));
        scene.frame(16.0);
        let element = scene.node(boxed).unwrap().element;
        let transform = scene.host().style(element, "transform").unwrap();
        assert!(transform.ends_with("10, 20, 30, 1)"), "{transform}");
    }

    #[test]
    fn anchor_receives_view_transform() {
        let mut scene = scene();
        scene.set_position(scene.ambient(), Vec3::new(9.0, 9.0, 9.0));
        scene.frame(0.0);
        let element = scene.node(scene.ambient()).unwrap().element;
        assert_eq!(
            scene.host().style(element, "transform").as_deref(),
            Some("matrix3d(1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1)")
        );
    }

    #[test]
    fn dispose_detaches_everything() {
        let mut scene = scene();
        scene.handle_event(&SceneEvent::MouseDown { button: 0 });
        scene.dispose();

        assert!(scene.is_disposed());
        assert!(scene.paused());
        assert_eq!(scene.host().listener_count(), 0);
        assert_eq!(scene.host().pointer_lock_element(), None);
        assert_eq!(scene.host().parent_of(scene.viewport()), None);

        let pending = scene.host().pending_frames();
        scene.frame(100.0);
        assert_eq!(scene.host().pending_frames(), pending);

        scene.handle_event(&SceneEvent::MouseDown { button: 0 });
        assert!(scene.paused());
    }

    #[test]
    fn accessors_pass_through_to_viewport() {
        let mut scene = scene();
        let viewport = scene.viewport();
        scene.host_mut().set_offset_size(viewport, 800.0, 600.0);
        scene.add_class("dark");
        scene.set_style("background", "black");

        assert_eq!(scene.width(), 800.0);
        assert_eq!(scene.height(), 600.0);
        assert_eq!(scene.class_list(), vec!["scene-viewport", "dark"]);
        assert_eq!(scene.style("background").as_deref(), Some("black"));
    }

    #[test]
    fn append_accepts_elements_and_nodes() {
        let mut scene = scene();
        let overlay = scene.host_mut().create_element("div", "hud").unwrap();
        let boxed = scene.create_box("b", 1.0, 1.0, 1.0).unwrap();

        assert_eq!(scene.append(Appendable::Element(overlay)), Appendable::Element(overlay));
        scene.append(Appendable::Node(boxed));

        let box_element = scene.node(boxed).unwrap().element;
        assert_eq!(scene.host().parent_of(overlay), Some(scene.viewport()));
        assert_eq!(scene.host().parent_of(box_element), Some(scene.viewport()));
    }

    #[test]
    fn appended_node_leaves_its_graph_parent() {
        let mut scene = scene();
        let group = scene.create_empty("group").unwrap();
        let inner = scene.create_box("inner", 1.0, 1.0, 1.0).unwrap();
        assert!(scene.assemble(group, inner));

        scene.append(Appendable::Node(inner));
        assert_eq!(scene.node(inner).unwrap().parent, None);
        assert!(scene.children(group).is_empty());

        // Removing the old parent no longer reaches the appended node.
        scene.remove_object(group).unwrap();
        let element = scene.node(inner).unwrap().element;
        assert_eq!(scene.host().parent_of(element), Some(scene.viewport()));

        scene.remove_object(inner).unwrap();
        assert!(!scene.host().contains(element));
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn appending_the_ambient_root_is_ignored() {
        let mut scene = scene();
        let ambient = scene.ambient();
        scene.append(Appendable::Node(ambient));
        let element = scene.node(ambient).unwrap().element;
        assert_eq!(scene.host().parent_of(element), Some(scene.viewport()));
        assert_eq!(scene.node(ambient).unwrap().parent, None);
    }
}
