//! In-memory document tree
//!
//! A single-threaded stand-in for the subset of the DOM a widget touches:
//! elements with ordered attributes, text nodes, parent/child links, the
//! focused node, a text selection, live form values and document-level
//! listener registrations. Widgets and the host share one document through
//! [`SharedDocument`].

use std::cell::RefCell;
use std::rc::Rc;

use dpicker_core::events::EventType;
use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};

use crate::event_handler::{EventHandlers, HandlerName};

new_key_type! {
    /// Handle to a node of a [`Document`]
    pub struct NodeId;

    /// Handle to a document-level listener registration
    pub struct ListenerId;
}

/// A document shared between the host and its widgets
pub type SharedDocument = Rc<RefCell<Document>>;

/// Element payload
#[derive(Clone, Debug, Default)]
pub struct ElementData {
    pub tag: String,
    /// Attributes in insertion order
    pub attributes: IndexMap<String, String>,
    /// Handler bindings copied from the virtual tree
    pub handlers: EventHandlers,
    /// Sibling key copied from the virtual tree
    pub key: Option<String>,
    /// Live form value set by the user, shadows the `value` attribute
    live_value: Option<String>,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
pub struct DomNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Counters of the mutations applied to a document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub created: usize,
    pub removed: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub text_updates: usize,
    pub handlers_replaced: usize,
    pub moved: usize,
}

impl MutationStats {
    /// Total number of mutations
    pub fn total(&self) -> usize {
        self.created
            + self.removed
            + self.attributes_set
            + self.attributes_removed
            + self.text_updates
            + self.handlers_replaced
            + self.moved
    }
}

/// A document-level listener registration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalListener {
    pub event_type: EventType,
    /// Id of the widget that owns the registration
    pub owner: String,
}

/// The document tree
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, DomNode>,
    body: NodeId,
    focused: Option<NodeId>,
    selection: Option<NodeId>,
    listeners: SlotMap<ListenerId, GlobalListener>,
    stats: MutationStats,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a `body` element
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(DomNode {
            kind: NodeKind::Element(ElementData {
                tag: "body".to_string(),
                ..Default::default()
            }),
            parent: None,
            children: Vec::new(),
        });
        Self {
            nodes,
            body,
            focused: None,
            selection: None,
            listeners: SlotMap::with_key(),
            stats: MutationStats::default(),
        }
    }

    /// Wrap for sharing with widgets
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id)
    }

    /// Number of live nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    // =========================================================================
    // Creation and structure
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.stats.created += 1;
        self.nodes.insert(DomNode {
            kind: NodeKind::Element(ElementData {
                tag: tag.into(),
                ..Default::default()
            }),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.stats.created += 1;
        self.nodes.insert(DomNode {
            kind: NodeKind::Text(content.into()),
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Tag name of an element
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Text(content) => Some(content),
            NodeKind::Element(_) => None,
        }
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let Some(DomNode {
            kind: NodeKind::Text(current),
            ..
        }) = self.nodes.get_mut(id)
        {
            if current != content {
                *current = content.to_string();
                self.stats.text_updates += 1;
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Append `child` to `parent`, moving it if it is attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` among the children of `parent`
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        if self.is_inside(parent, child) {
            // would create a cycle
            return;
        }
        if self.parent(child) == Some(parent)
            && self.children(parent).get(index) == Some(&child)
        {
            return;
        }
        if self.detach(child) {
            self.stats.moved += 1;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Detach a node from its parent; returns true if it had one
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
        true
    }

    /// Remove a node and its descendants from the document
    pub fn remove(&mut self, id: NodeId) {
        if id == self.body {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                self.stats.removed += 1;
                if self.focused == Some(current) {
                    self.focused = None;
                }
                if self.selection == Some(current) {
                    self.selection = None;
                }
            }
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        self.element(id).map(|e| &e.attributes)
    }

    /// Set an attribute; setting the current value is not a mutation
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        if element.attributes.get(name).map(String::as_str) == Some(value) {
            return;
        }
        element
            .attributes
            .insert(name.to_string(), value.to_string());
        self.stats.attributes_set += 1;
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let removed = self
            .element_mut(id)
            .and_then(|e| e.attributes.shift_remove(name))
            .is_some();
        if removed {
            self.stats.attributes_removed += 1;
        }
    }

    /// Add a class to the `class` attribute
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let classes = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &classes);
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    // =========================================================================
    // Handler bindings
    // =========================================================================

    pub fn handlers(&self, id: NodeId) -> Option<&EventHandlers> {
        self.element(id).map(|e| &e.handlers)
    }

    /// Replace all bindings of a node
    pub fn set_handlers(&mut self, id: NodeId, handlers: &EventHandlers) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        if &element.handlers != handlers {
            element.handlers = handlers.clone();
            self.stats.handlers_replaced += 1;
        }
    }

    /// Add one binding to a node
    pub fn bind(&mut self, id: NodeId, event_type: EventType, name: impl Into<HandlerName>) {
        if let Some(element) = self.element_mut(id) {
            element.handlers.on(event_type, name);
        }
    }

    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.key.as_deref()
    }

    pub fn set_key(&mut self, id: NodeId, key: Option<String>) {
        if let Some(element) = self.element_mut(id) {
            element.key = key;
        }
    }

    // =========================================================================
    // Form values
    // =========================================================================

    /// Live value of a form control.
    ///
    /// `select` reports its selected option (first option when none is
    /// marked), other elements their `value` attribute, unless the user set
    /// a value since the last reset.
    pub fn value(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return String::new();
        };
        if let Some(live) = &element.live_value {
            return live.clone();
        }
        if element.tag == "select" {
            let options = self.query_all_tag(id, "option");
            let selected = options
                .iter()
                .find(|&&o| self.attribute(o, "selected").is_some())
                .or_else(|| options.first());
            return selected
                .map(|&o| self.option_value(o))
                .unwrap_or_default();
        }
        element
            .attributes
            .get("value")
            .cloned()
            .unwrap_or_default()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attribute(option, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(option),
        }
    }

    /// Set the live value, as typing or picking an option does
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.live_value = Some(value.into());
        }
    }

    /// Drop the live value so the control reflects its markup again
    pub fn reset_value(&mut self, id: NodeId) {
        if let Some(element) = self.element_mut(id) {
            element.live_value = None;
        }
    }

    pub fn has_live_value(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.live_value.is_some())
    }

    // =========================================================================
    // Focus and selection
    // =========================================================================

    pub fn focus(&mut self, id: NodeId) {
        if self.is_element(id) {
            self.focused = Some(id);
        }
    }

    /// Remove focus from `id` if it holds it
    pub fn blur(&mut self, id: NodeId) {
        if self.focused == Some(id) {
            self.focused = None;
            if self.selection == Some(id) {
                self.selection = None;
            }
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Select the whole text of a control
    pub fn select_text(&mut self, id: NodeId) {
        if self.is_element(id) {
            self.selection = Some(id);
        }
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Descendants of `root` in document order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            found.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Attached element whose `id` attribute equals `id`
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(id))
    }

    /// First descendant of `root` with the given tag
    pub fn query_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.tag(n) == Some(tag))
    }

    /// All descendants of `root` with the given tag
    pub fn query_all_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.tag(n) == Some(tag))
            .collect()
    }

    /// True if `node` is `ancestor` or one of its descendants
    pub fn is_inside(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True if `start` or one of its ancestors carries the `id` attribute `id`
    pub fn is_within_id(&self, start: Option<NodeId>, id: &str) -> bool {
        let mut current = start;
        while let Some(node) = current {
            if self.attribute(node, "id") == Some(id) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// `target` followed by its ancestors, innermost first
    pub fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.contains(target).then_some(target);
        while let Some(id) = current {
            path.push(id);
            current = self.parent(id);
        }
        path
    }

    /// Concatenated text of a node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(content) = self.text(id) {
            return content.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    // =========================================================================
    // Document-level listeners
    // =========================================================================

    /// Register a document-level listener for `owner`
    pub fn add_listener(&mut self, event_type: EventType, owner: impl Into<String>) -> ListenerId {
        self.listeners.insert(GlobalListener {
            event_type,
            owner: owner.into(),
        })
    }

    /// Unregister; returns false if the registration was already gone
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(id)
    }

    pub fn listener(&self, id: ListenerId) -> Option<&GlobalListener> {
        self.listeners.get(id)
    }

    /// Registrations for an event type
    pub fn listeners_for(&self, event_type: EventType) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, l)| l.event_type == event_type)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpicker_core::event_types;

    fn input_in_form(doc: &mut Document) -> (NodeId, NodeId) {
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        doc.append_child(doc.body(), form);
        doc.append_child(form, input);
        (form, input)
    }

    #[test]
    fn test_structure() {
        let mut doc = Document::new();
        let (form, input) = input_in_form(&mut doc);
        let label = doc.create_element("label");
        doc.insert_child(form, 0, label);

        assert_eq!(doc.children(form), &[label, input]);
        assert_eq!(doc.parent(input), Some(form));
        assert!(doc.is_inside(input, doc.body()));
        assert_eq!(doc.event_path(input), vec![input, form, doc.body()]);

        // moving an attached node
        doc.append_child(form, label);
        assert_eq!(doc.children(form), &[input, label]);
        assert_eq!(doc.stats().moved, 1);

        assert!(doc.detach(input));
        assert_eq!(doc.parent(input), None);
        assert!(!doc.detach(input));
    }

    #[test]
    fn test_no_cycles() {
        let mut doc = Document::new();
        let (form, input) = input_in_form(&mut doc);
        doc.append_child(input, form);
        assert_eq!(doc.parent(form), Some(doc.body()));
    }

    #[test]
    fn test_remove_subtree_clears_focus() {
        let mut doc = Document::new();
        let (form, input) = input_in_form(&mut doc);
        doc.focus(input);
        doc.select_text(input);
        doc.reset_stats();

        doc.remove(form);

        assert!(!doc.contains(input));
        assert_eq!(doc.focused(), None);
        assert_eq!(doc.selection(), None);
        assert_eq!(doc.stats().removed, 2);
        assert!(doc.children(doc.body()).is_empty());
    }

    #[test]
    fn test_attributes_and_classes() {
        let mut doc = Document::new();
        let (form, _) = input_in_form(&mut doc);
        doc.reset_stats();

        doc.set_attribute(form, "id", "birthday");
        doc.set_attribute(form, "id", "birthday");
        assert_eq!(doc.stats().attributes_set, 1);

        doc.add_class(form, "dpicker");
        doc.add_class(form, "dpicker");
        assert_eq!(doc.attribute(form, "class"), Some("dpicker"));
        assert!(doc.has_class(form, "dpicker"));

        doc.remove_attribute(form, "class");
        doc.remove_attribute(form, "class");
        assert_eq!(doc.stats().attributes_removed, 1);
        assert_eq!(doc.find_by_id("birthday"), Some(form));
    }

    #[test]
    fn test_input_value() {
        let mut doc = Document::new();
        let (_, input) = input_in_form(&mut doc);
        doc.set_attribute(input, "value", "01/01/2020");
        assert_eq!(doc.value(input), "01/01/2020");

        doc.set_value(input, "02/01/2020");
        assert_eq!(doc.value(input), "02/01/2020");
        assert!(doc.has_live_value(input));

        doc.reset_value(input);
        assert_eq!(doc.value(input), "01/01/2020");
    }

    #[test]
    fn test_select_value() {
        let mut doc = Document::new();
        let select = doc.create_element("select");
        doc.append_child(doc.body(), select);
        for year in ["2021", "2020"] {
            let option = doc.create_element("option");
            doc.set_attribute(option, "value", year);
            doc.append_child(select, option);
        }
        assert_eq!(doc.value(select), "2021");

        let second = doc.children(select)[1];
        doc.set_attribute(second, "selected", "selected");
        assert_eq!(doc.value(select), "2020");
    }

    #[test]
    fn test_within_id() {
        let mut doc = Document::new();
        let (form, input) = input_in_form(&mut doc);
        doc.set_attribute(form, "id", "picker");
        let outside = doc.create_element("p");
        doc.append_child(doc.body(), outside);

        assert!(doc.is_within_id(Some(input), "picker"));
        assert!(!doc.is_within_id(Some(outside), "picker"));
        assert!(!doc.is_within_id(None, "picker"));
    }

    #[test]
    fn test_listeners() {
        let mut doc = Document::new();
        let click = doc.add_listener(event_types::CLICK, "picker-a");
        let touch = doc.add_listener(event_types::TOUCH_END, "picker-a");

        assert_eq!(doc.listeners_for(event_types::CLICK), vec![click]);
        assert_eq!(doc.listener_count(), 2);
        assert!(doc.remove_listener(touch));
        assert!(!doc.remove_listener(touch));
        assert!(!doc.has_listener(touch));
        assert_eq!(doc.listener(click).map(|l| l.owner.as_str()), Some("picker-a"));
    }

    #[test]
    fn test_text_content() {
        let mut doc = Document::new();
        let td = doc.create_element("td");
        let span = doc.create_element("span");
        let text = doc.create_text("31");
        doc.append_child(td, span);
        doc.append_child(span, text);

        assert_eq!(doc.text_content(td), "31");
        doc.reset_stats();
        doc.set_text(text, "30");
        doc.set_text(text, "30");
        assert_eq!(doc.stats().text_updates, 1);
    }
}
