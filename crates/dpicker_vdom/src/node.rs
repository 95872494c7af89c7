//! Virtual tree nodes with a hyperscript-style builder
//!
//! ```rust
//! use dpicker_vdom::prelude::*;
//!
//! let select = h("select")
//!     .attr("name", "dpicker-year")
//!     .on_change("yearChange")
//!     .child(h("option").key("2020").attr("value", "2020").text("2020"))
//!     .child(h("option").key("2019").attr("value", "2019").text("2019"));
//!
//! let node: VNode = select.into();
//! assert_eq!(node.children().len(), 2);
//! ```

use std::collections::BTreeMap;

use dpicker_core::events::EventType;

use crate::event_handler::{EventHandlers, HandlerName};

/// A node of the virtual tree
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VNode {
    Element(VElement),
    Text(String),
}

/// An element of the virtual tree
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VElement {
    /// Tag name (`div`, `select`, ...)
    pub tag: String,
    /// Identity among siblings, used to reuse nodes across reorders
    pub key: Option<String>,
    /// Attributes, sorted by name
    pub attributes: BTreeMap<String, String>,
    /// Handler bindings
    pub handlers: EventHandlers,
    /// Child nodes in order
    pub children: Vec<VNode>,
}

/// Start building an element
pub fn h(tag: impl Into<String>) -> VElement {
    VElement::new(tag)
}

/// Create a text node
pub fn text(content: impl Into<String>) -> VNode {
    VNode::Text(content.into())
}

impl VElement {
    /// Create a new element with no attributes or children
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Set an attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an attribute only when `condition` holds
    pub fn attr_if(self, condition: bool, name: impl Into<String>, value: impl Into<String>) -> Self {
        if condition {
            self.attr(name, value)
        } else {
            self
        }
    }

    /// Set the `id` attribute
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Append a class to the `class` attribute (empty names are ignored)
    pub fn class(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return self;
        }
        let classes = self.attributes.entry("class".to_string()).or_default();
        if !classes.split_whitespace().any(|c| c == name) {
            if !classes.is_empty() {
                classes.push(' ');
            }
            classes.push_str(name);
        }
        self
    }

    /// Append a class only when `condition` holds
    pub fn class_if(self, condition: bool, name: impl AsRef<str>) -> Self {
        if condition {
            self.class(name)
        } else {
            self
        }
    }

    /// Set the sibling key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    // =========================================================================
    // Event bindings
    // =========================================================================

    /// Bind a handler name to an event type
    pub fn on(mut self, event_type: EventType, name: impl Into<HandlerName>) -> Self {
        self.handlers.on(event_type, name);
        self
    }

    pub fn on_click(mut self, name: impl Into<HandlerName>) -> Self {
        self.handlers.on_click(name);
        self
    }

    pub fn on_change(mut self, name: impl Into<HandlerName>) -> Self {
        self.handlers.on_change(name);
        self
    }

    pub fn on_focus(mut self, name: impl Into<HandlerName>) -> Self {
        self.handlers.on_focus(name);
        self
    }

    pub fn on_blur(mut self, name: impl Into<HandlerName>) -> Self {
        self.handlers.on_blur(name);
        self
    }

    pub fn on_key_down(mut self, name: impl Into<HandlerName>) -> Self {
        self.handlers.on_key_down(name);
        self
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Append a child
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a child if present
    pub fn maybe_child(mut self, child: Option<VNode>) -> Self {
        if let Some(child) = child {
            self.children.push(child);
        }
        self
    }

    /// Append several children
    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<VNode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a text child
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(VNode::Text(content.into()))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get an attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Check the `class` attribute for a class name
    pub fn has_class(&self, name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == name))
    }
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        VNode::Element(element)
    }
}

impl From<&str> for VNode {
    fn from(content: &str) -> Self {
        VNode::Text(content.to_string())
    }
}

impl From<String> for VNode {
    fn from(content: String) -> Self {
        VNode::Text(content)
    }
}

impl VNode {
    /// The element, if this is one
    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            VNode::Element(element) => Some(element),
            VNode::Text(_) => None,
        }
    }

    /// Tag name for elements
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }

    /// Sibling key for elements
    pub fn key(&self) -> Option<&str> {
        self.as_element().and_then(|e| e.key.as_deref())
    }

    /// Children (empty for text)
    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(element) => &element.children,
            VNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text(content) => content.clone(),
            VNode::Element(element) => element.children.iter().map(VNode::text_content).collect(),
        }
    }

    /// Depth-first search for the first element matching `predicate`
    pub fn find(&self, predicate: &dyn Fn(&VElement) -> bool) -> Option<&VElement> {
        let element = self.as_element()?;
        if predicate(element) {
            return Some(element);
        }
        element.children.iter().find_map(|child| child.find(predicate))
    }

    /// All elements matching `predicate`, in document order
    pub fn find_all(&self, predicate: &dyn Fn(&VElement) -> bool) -> Vec<&VElement> {
        let mut found = Vec::new();
        self.collect(predicate, &mut found);
        found
    }

    fn collect<'a>(&'a self, predicate: &dyn Fn(&VElement) -> bool, found: &mut Vec<&'a VElement>) {
        if let VNode::Element(element) = self {
            if predicate(element) {
                found.push(element);
            }
            for child in &element.children {
                child.collect(predicate, found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpicker_core::event_types;

    #[test]
    fn test_builder_attributes_and_classes() {
        let el = h("td")
            .class("dpicker-active")
            .class("dpicker-active")
            .class_if(false, "hidden")
            .class("")
            .attr_if(true, "aria-label", "Day 3");

        assert_eq!(el.attribute("class"), Some("dpicker-active"));
        assert!(el.has_class("dpicker-active"));
        assert!(!el.has_class("hidden"));
        assert_eq!(el.attribute("aria-label"), Some("Day 3"));
    }

    #[test]
    fn test_identical_builds_are_equal() {
        let build = || -> VNode {
            h("button")
                .attr("value", "3")
                .on_click("dayClick")
                .on(event_types::KEY_DOWN, "dayKeyDown")
                .text("3")
                .into()
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn test_queries() {
        let tree: VNode = h("table")
            .child(h("tr").child(h("th").text("Sun")).child(h("th").text("Mon")))
            .child(
                h("tr")
                    .child(h("td").class("dpicker-inactive").child(h("span").text("31")))
                    .child(h("td").class("dpicker-active").child(h("button").text("1"))),
            )
            .maybe_child(None)
            .into();

        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.find_all(&|e| e.tag == "td").len(), 2);
        assert_eq!(
            tree.find(&|e| e.has_class("dpicker-active"))
                .map(|e| VNode::Element(e.clone()).text_content()),
            Some("1".to_string())
        );
        assert_eq!(tree.text_content(), "SunMon311");
    }
}
