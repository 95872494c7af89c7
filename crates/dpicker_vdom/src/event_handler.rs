//! Event bindings for tree nodes
//!
//! Nodes do not carry closures. They carry handler *names* per event type,
//! and the widget resolves names against its own handler table when an event
//! arrives. Two trees built from the same state therefore compare equal and
//! hash the same, which is what the diff quick path relies on.
//!
//! # Architecture
//!
//! ```text
//! VElement
//!     ↓ .on_click("dayClick")
//! EventHandlers (names stored on the virtual node)
//!     ↓ reconcile
//! Document node bindings
//!     ↓ DomEvent dispatched by the widget
//! Named handler invoked with an EventContext
//! ```

use std::borrow::Cow;
use std::cell::Cell;
use std::collections::BTreeMap;

use dpicker_core::events::{event_types, EventType, KeyCode};
use smallvec::SmallVec;

use crate::document::NodeId;

/// Name of a handler in the widget's handler table
pub type HandlerName = Cow<'static, str>;

/// A raw event as raised by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomEvent {
    /// The type of event that occurred
    pub event_type: EventType,
    /// The node the event was raised on
    pub target: NodeId,
    /// Node gaining focus for BLUR events (if any)
    pub related_target: Option<NodeId>,
    /// Key code for KEY_DOWN events
    pub key_code: KeyCode,
}

impl DomEvent {
    /// Create a new event raised on `target`
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            related_target: None,
            key_code: 0,
        }
    }

    /// Set the related target (for BLUR events)
    pub fn with_related_target(mut self, related: NodeId) -> Self {
        self.related_target = Some(related);
        self
    }

    /// Set key code (for KEY_DOWN events)
    pub fn with_key_code(mut self, code: KeyCode) -> Self {
        self.key_code = code;
        self
    }
}

/// Context passed to handlers while an event is being dispatched
#[derive(Debug)]
pub struct EventContext {
    /// The raw event
    pub event: DomEvent,
    /// Live value of the target (input text, selected option, button value)
    pub target_value: Option<String>,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl EventContext {
    /// Create a context; the current target starts at the event target
    pub fn new(event: DomEvent, target_value: Option<String>) -> Self {
        let target = event.target;
        Self {
            event,
            target_value,
            current_target: Cell::new(target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type
    }

    pub fn target(&self) -> NodeId {
        self.event.target
    }

    pub fn related_target(&self) -> Option<NodeId> {
        self.event.related_target
    }

    pub fn key_code(&self) -> KeyCode {
        self.event.key_code
    }

    /// Node whose bindings are currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    /// Advance the bubbling position
    pub fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop bubbling and skip document-level listeners
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// Handler bindings on a node, keyed by event type
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventHandlers {
    handlers: BTreeMap<EventType, SmallVec<[HandlerName; 1]>>,
}

impl EventHandlers {
    /// Create a new empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any bindings
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Check if a binding exists for a specific event type
    pub fn has_handler(&self, event_type: EventType) -> bool {
        self.handlers.contains_key(&event_type)
    }

    /// Bind a handler name to an event type
    pub fn on(&mut self, event_type: EventType, name: impl Into<HandlerName>) {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(name.into());
    }

    /// Handler names bound to an event type, in binding order
    pub fn get(&self, event_type: EventType) -> &[HandlerName] {
        self.handlers
            .get(&event_type)
            .map(|names| names.as_slice())
            .unwrap_or(&[])
    }

    /// All bound event types
    pub fn event_types(&self) -> impl Iterator<Item = EventType> + '_ {
        self.handlers.keys().copied()
    }

    /// Merge another set of bindings into this one
    pub fn merge(&mut self, other: EventHandlers) {
        for (event_type, names) in other.handlers {
            self.handlers.entry(event_type).or_default().extend(names);
        }
    }

    // =========================================================================
    // Convenience registration methods
    // =========================================================================

    pub fn on_click(&mut self, name: impl Into<HandlerName>) {
        self.on(event_types::CLICK, name);
    }

    pub fn on_change(&mut self, name: impl Into<HandlerName>) {
        self.on(event_types::CHANGE, name);
    }

    pub fn on_focus(&mut self, name: impl Into<HandlerName>) {
        self.on(event_types::FOCUS, name);
    }

    pub fn on_blur(&mut self, name: impl Into<HandlerName>) {
        self.on(event_types::BLUR, name);
    }

    pub fn on_key_down(&mut self, name: impl Into<HandlerName>) {
        self.on(event_types::KEY_DOWN, name);
    }
}
