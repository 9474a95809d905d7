//! In-memory element tree the runtime renders into
//!
//! Screens are container elements under the root, hit-regions are button
//! elements inside a per-screen overlay layer, and stylesheets are `link`
//! elements under `head`. Hosts (the terminal renderer, tests, tooling) read
//! the tree; the screen manager is the only writer of screen state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

pub const SCREEN_CLASS: &str = "screen";
pub const ACTIVE_CLASS: &str = "is-active";
pub const SCREEN_ATTR: &str = "data-screen";
pub const ROOT_ID: &str = "app-root";

/// Handle to an element in a [`Document`]. Slots are reused once their
/// element is removed; the generation keeps an old handle from addressing
/// the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// A single element: tag, classes, attributes, inline style and tree links
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            parent: None,
            children: Vec::new(),
            classes: BTreeSet::new(),
            attrs: BTreeMap::new(),
            style: BTreeMap::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Arena-backed element tree with a fixed `head` and root container
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: NodeId,
    root: NodeId,
}

/// Document shared between the screen manager, controllers and hosts
pub type SharedDocument = Arc<Mutex<Document>>;

/// Lock a shared document
pub fn lock_document(document: &SharedDocument) -> MutexGuard<'_, Document> {
    crate::sync::lock(document)
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let placeholder = NodeId { index: 0, generation: 0 };
        let mut document = Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: placeholder,
            root: placeholder,
        };
        document.head = document.create_element("head");
        document.root = document.create_element("div");
        document.set_attr(document.root, "id", ROOT_ID);
        document
    }

    /// Build a document with one screen container per identifier, in order
    pub fn with_screens<'a>(screen_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut document = Self::new();
        for id in screen_ids {
            document.add_screen(id);
        }
        document
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of arena slots, live or waiting for reuse
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    /// Create a detached element, reusing a vacated slot when there is one
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Some(Element::new(tag));
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.element = element;
                NodeId { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, element });
                NodeId { index: self.slots.len() - 1, generation: 0 }
            }
        }
    }

    /// Empty the slot behind `id` and queue it for reuse. Returns the element.
    fn release(&mut self, id: NodeId) -> Option<Element> {
        let slot = self.slots.get_mut(id.index).filter(|slot| slot.generation == id.generation)?;
        let element = slot.element.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(element)
    }

    /// Append `child` to `parent`, moving it out of its previous parent.
    /// Returns false when either node is gone or the move would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.element(parent).is_none() || self.element(child).is_none() || self.contains(child, parent) {
            return false;
        }
        self.detach(child);
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.element_mut(parent) {
            el.children.push(child);
        }
        true
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.element(node).and_then(Element::parent) else {
            return;
        };
        if let Some(el) = self.element_mut(parent) {
            el.children.retain(|c| *c != node);
        }
        if let Some(el) = self.element_mut(node) {
            el.parent = None;
        }
    }

    /// Remove an element and its whole subtree. `head` and the root stay put.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.head || node == self.root {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(el) = self.release(id) {
                stack.extend(el.children);
            }
        }
    }

    /// Remove every child of `node`
    pub fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node) {
            self.remove(child);
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element(node).map(|el| el.children.clone()).unwrap_or_default()
    }

    /// Descendants of `node` in document order, excluding `node` itself
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// True when `node` is `ancestor` or lives somewhere below it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.element(id).and_then(Element::parent);
        }
        false
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.insert(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.remove(class);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.insert(name.to_string(), value.into());
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.style.insert(property.to_string(), value.into());
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.style(property))
    }

    /// First descendant of `scope` carrying `class`
    pub fn query_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope).into_iter().find(|id| self.has_class(*id, class))
    }

    /// All descendants of `scope` carrying `class`, in document order
    pub fn query_all_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// Nearest element carrying `class`, starting at `node` and walking up
    pub fn closest(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if self.has_class(id, class) {
                return Some(id);
            }
            cursor = self.element(id).and_then(Element::parent);
        }
        None
    }

    /// Append a screen container for `screen_id` under the root
    pub fn add_screen(&mut self, screen_id: &str) -> NodeId {
        let section = self.create_element("section");
        self.add_class(section, SCREEN_CLASS);
        self.set_attr(section, SCREEN_ATTR, screen_id);
        self.append_child(self.root, section);
        section
    }

    /// Every screen container under the root with its identifier
    pub fn screens(&self) -> Vec<(String, NodeId)> {
        self.query_all_class(self.root, SCREEN_CLASS)
            .into_iter()
            .filter_map(|id| self.attr(id, SCREEN_ATTR).map(|s| (s.to_string(), id)))
            .filter(|(s, _)| !s.is_empty())
            .collect()
    }

    /// Screen containers currently carrying the active marker
    pub fn active_screens(&self) -> Vec<NodeId> {
        self.query_all_class(self.root, SCREEN_CLASS)
            .into_iter()
            .filter(|id| self.has_class(*id, ACTIVE_CLASS))
            .collect()
    }

    /// Identifier of a screen container
    pub fn screen_id(&self, container: NodeId) -> Option<&str> {
        self.attr(container, SCREEN_ATTR)
    }

    /// Append a stylesheet link to `head`
    pub fn insert_stylesheet(&mut self, href: &str) -> NodeId {
        let link = self.create_element("link");
        self.set_attr(link, "rel", "stylesheet");
        self.set_attr(link, "href", href);
        self.append_child(self.head, link);
        link
    }

    /// Hrefs of every stylesheet link under `head`, in insertion order
    pub fn stylesheets(&self) -> Vec<String> {
        self.children(self.head)
            .into_iter()
            .filter(|id| self.attr(*id, "rel") == Some("stylesheet"))
            .filter_map(|id| self.attr(id, "href").map(str::to_string))
            .collect()
    }
}
