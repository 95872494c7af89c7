//! Widget controller
//!
//! [`DatePicker`] owns one widget: its state, its handler composition, the
//! last rendered tree and its document-level listeners. It is built once by
//! [`DatePickerBuilder::mount`] and then driven by [`DatePicker::handle_event`].
//!
//! # Event flow
//!
//! ```text
//! DomEvent
//!     ↓ handle_event
//! bindings on target..container (bubbling)
//!     ↓ dispatch(name)
//! Handler mutates PickerState
//!     ↓ redraw
//! view::render → reconcile into the Document
//!     ↓ notify
//! host on_change callback
//! ```

use std::fmt;
use std::rc::Rc;

use chrono::NaiveDateTime;
use dpicker_core::{event_types, ChronoAdapter, DateAdapter, EventType};
use dpicker_vdom::{
    diff, mount, reconcile, unique_id, Document, DomEvent, EventContext, ListenerId, NodeId,
    SharedDocument, VNode,
};
use indexmap::IndexMap;
use tracing::{debug, trace, warn, Level};

use crate::config::{AttributeOverrides, DatePickerOptions};
use crate::error::{DatePickerError, Result};
use crate::handlers;
use crate::module::{Composition, Module};
use crate::state::PickerState;
use crate::view;

/// Host change callback
pub type OnChange = Box<dyn Fn(&PickerState, &ChangeEvent)>;

/// Passed to the host callback after every committed state change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The value (or emptiness) may have changed, not just visibility
    pub model_changed: bool,
    /// Handler that produced the change
    pub name: String,
    /// Event that triggered it, if any
    pub event: Option<DomEvent>,
}

/// Where to mount a picker
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountTarget {
    Node(NodeId),
    /// Element with this `id` attribute
    Id(String),
}

impl MountTarget {
    fn resolve(&self, doc: &Document) -> Result<NodeId> {
        let node = match self {
            MountTarget::Node(id) => doc.contains(*id).then_some(*id),
            MountTarget::Id(id) => doc.find_by_id(id),
        };
        node.ok_or(DatePickerError::MissingContainer)
    }
}

impl From<NodeId> for MountTarget {
    fn from(id: NodeId) -> Self {
        MountTarget::Node(id)
    }
}

impl From<&str> for MountTarget {
    fn from(id: &str) -> Self {
        MountTarget::Id(id.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(id: String) -> Self {
        MountTarget::Id(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Mounted,
}

// =============================================================================
// Builder
// =============================================================================

/// Collects options, adapter, modules and callback before mounting
#[derive(Default)]
pub struct DatePickerBuilder {
    options: DatePickerOptions,
    adapter: Option<Rc<dyn DateAdapter>>,
    modules: Vec<Rc<dyn Module>>,
    on_change: Option<OnChange>,
}

impl DatePickerBuilder {
    pub fn options(mut self, options: DatePickerOptions) -> Self {
        self.options = options;
        self
    }

    /// Date adapter; defaults to [`ChronoAdapter::new`]
    pub fn adapter(mut self, adapter: impl DateAdapter + 'static) -> Self {
        self.adapter = Some(Rc::new(adapter));
        self
    }

    /// Add a module; later modules' handlers run first
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Rc::new(module));
        self
    }

    pub fn on_change(mut self, callback: impl Fn(&PickerState, &ChangeEvent) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Build the widget and mount it on `target`.
    ///
    /// An `input` target is replaced by the widget inside its parent, after
    /// its attributes have been harvested. Any other element receives the
    /// widget as its last child.
    pub fn mount(
        self,
        document: &SharedDocument,
        target: impl Into<MountTarget>,
    ) -> Result<DatePicker> {
        let adapter = self
            .adapter
            .unwrap_or_else(|| Rc::new(ChronoAdapter::new()) as Rc<dyn DateAdapter>);
        let composition = Rc::new(Composition::compose(self.modules));
        let mut extensions = composition.extension_defaults();

        let (node, input_attributes, container) = {
            let doc = document.borrow();
            let target: MountTarget = target.into();
            let node = target.resolve(&doc)?;
            if !doc.is_element(node) {
                return Err(DatePickerError::NotAnElement);
            }
            if doc.tag(node) == Some("input") {
                let parent = doc
                    .parent(node)
                    .ok_or(DatePickerError::InputWithoutParent)?;
                let attributes = doc.attributes(node).cloned().unwrap_or_default();
                (node, Some(attributes), parent)
            } else {
                (node, None, node)
            }
        };

        let mut overrides = AttributeOverrides::default();
        if let Some(attributes) = &input_attributes {
            overrides = AttributeOverrides::harvest(attributes);
            for module in composition.modules() {
                module.parse_attributes(attributes, &mut extensions, &mut overrides);
            }
        }
        for (key, value) in &self.options.extra {
            extensions.insert(key.clone(), value.clone());
        }

        let mut state = PickerState::resolve(adapter.as_ref(), &overrides, &self.options);
        state.extensions = extensions;
        if state.range_inverted() {
            return Err(DatePickerError::InvertedRange {
                min: state.min.to_string(),
                max: state.max.to_string(),
            });
        }
        if state.input_id.is_empty() {
            state.input_id = unique_id("dpicker");
        }

        {
            let mut doc = document.borrow_mut();
            if input_attributes.is_some() {
                doc.remove(node);
                doc.add_class(container, view::CLASS_ROOT);
            }
            let existing = doc
                .attribute(container, "id")
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            state.container_id = match existing {
                Some(id) => id,
                None => {
                    let id = unique_id("dpicker");
                    doc.set_attribute(container, "id", &id);
                    id
                }
            };
        }

        let mut picker = DatePicker {
            state,
            adapter,
            composition: Rc::clone(&composition),
            document: Rc::clone(document),
            container,
            root: container,
            tree: VNode::Text(String::new()),
            listeners: Vec::new(),
            on_change: self.on_change,
            lifecycle: Lifecycle::Uninitialized,
        };

        for module in composition.modules() {
            debug!(module = module.name(), "initializing module");
            module.initialize(&mut picker);
        }
        picker.state.revalidate();
        picker.attach();

        debug!(
            container = %picker.state.container_id,
            input = %picker.state.input_id,
            valid = picker.state.valid,
            "date picker mounted"
        );
        Ok(picker)
    }
}

// =============================================================================
// DatePicker
// =============================================================================

/// A mounted date picker
pub struct DatePicker {
    state: PickerState,
    adapter: Rc<dyn DateAdapter>,
    composition: Rc<Composition>,
    document: SharedDocument,
    container: NodeId,
    root: NodeId,
    tree: VNode,
    listeners: Vec<(ListenerId, &'static str)>,
    on_change: Option<OnChange>,
    lifecycle: Lifecycle,
}

impl DatePicker {
    pub fn builder() -> DatePickerBuilder {
        DatePickerBuilder::default()
    }

    /// Mount with the default adapter and no modules
    pub fn create(
        document: &SharedDocument,
        target: impl Into<MountTarget>,
        options: DatePickerOptions,
    ) -> Result<Self> {
        Self::builder().options(options).mount(document, target)
    }

    /// First render, container bindings and document-level listeners
    fn attach(&mut self) {
        let tree = view::render(&self.state, self.adapter.as_ref(), &self.composition);
        let owner = self.state.container_id.clone();

        let mut doc = self.document.borrow_mut();
        self.root = mount(&mut doc, self.container, &tree);
        doc.bind(self.container, event_types::KEY_DOWN, handlers::KEY_DOWN);

        self.listeners = vec![
            (doc.add_listener(event_types::CLICK, owner.clone()), handlers::HIDE),
            (doc.add_listener(event_types::TOUCH_END, owner), handlers::INPUT_BLUR),
        ];
        drop(doc);

        self.tree = tree;
        self.lifecycle = Lifecycle::Mounted;
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Route one event raised on the document.
    ///
    /// Bindings run from the target up to the container, then the widget's
    /// document-level listeners, unless a handler stopped propagation.
    pub fn handle_event(&mut self, event: &DomEvent) {
        let (path, target_value) = {
            let mut doc = self.document.borrow_mut();
            if !doc.contains(event.target) {
                debug!(target = ?event.target, "ignoring event on a removed node");
                return;
            }
            match event.event_type {
                event_types::FOCUS => doc.focus(event.target),
                event_types::BLUR => doc.blur(event.target),
                _ => {}
            }
            let mut path = doc.event_path(event.target);
            match path.iter().position(|&n| n == self.container) {
                Some(end) => path.truncate(end + 1),
                None => path.clear(),
            }
            let value = doc.is_element(event.target).then(|| doc.value(event.target));
            (path, value)
        };

        let ctx = EventContext::new(event.clone(), target_value);

        for node in path {
            let names: Vec<_> = {
                let doc = self.document.borrow();
                if !doc.contains(node) {
                    continue;
                }
                doc.handlers(node)
                    .map(|h| h.get(event.event_type).to_vec())
                    .unwrap_or_default()
            };
            ctx.set_current_target(node);
            for name in names {
                self.dispatch(&name, &ctx);
            }
            if ctx.propagation_stopped() {
                return;
            }
        }

        for name in self.live_listeners(event.event_type) {
            self.dispatch(name, &ctx);
        }
    }

    fn live_listeners(&self, event_type: EventType) -> Vec<&'static str> {
        let doc = self.document.borrow();
        self.listeners
            .iter()
            .filter(|(id, _)| doc.listener(*id).is_some_and(|l| l.event_type == event_type))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Run every handler registered under `name`
    pub fn dispatch(&mut self, name: &str, ctx: &EventContext) {
        let handlers = self.composition.handlers(name);
        if handlers.is_empty() {
            warn!(handler = name, "no handler registered under this name");
            return;
        }
        for handler in handlers {
            handler(self, ctx);
        }
    }

    /// Rebuild the view and patch the document.
    ///
    /// Skips the patch when the new tree equals the last one.
    pub fn redraw(&mut self) {
        if self.lifecycle != Lifecycle::Mounted {
            return;
        }

        let tree = view::render(&self.state, self.adapter.as_ref(), &self.composition);
        if tree == self.tree {
            trace!(container = %self.state.container_id, "tree unchanged, skipping patch");
            return;
        }

        if tracing::enabled!(Level::TRACE) {
            let result = diff(&self.tree, &tree);
            trace!(
                changes = result.change_count(),
                attributes = result.changes.attributes,
                children = result.changes.children,
                "redrawing"
            );
        }

        let mut doc = self.document.borrow_mut();
        let before = doc.stats().total();
        self.root = if doc.contains(self.root) {
            reconcile(&mut doc, self.root, &tree)
        } else {
            mount(&mut doc, self.container, &tree)
        };
        trace!(mutations = doc.stats().total() - before, "patched");
        drop(doc);

        self.tree = tree;
    }

    /// Invoke the host callback; a no-op without one
    pub fn notify(&self, model_changed: bool, name: &str, event: Option<&DomEvent>) {
        debug!(handler = name, model_changed, "state changed");
        if let Some(callback) = &self.on_change {
            callback(
                &self.state,
                &ChangeEvent {
                    model_changed,
                    name: name.to_string(),
                    event: event.cloned(),
                },
            );
        }
    }

    /// True if `node`'s parent lies inside this widget's container
    pub fn is_inside_container(&self, node: NodeId) -> bool {
        let doc = self.document.borrow();
        doc.is_within_id(doc.parent(node), &self.state.container_id)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Remove the document-level listeners; the widget stops reacting to
    /// outside clicks and touches
    pub fn release_listeners(&mut self) {
        let mut doc = self.document.borrow_mut();
        for (id, _) in self.listeners.drain(..) {
            doc.remove_listener(id);
        }
        debug!(container = %self.state.container_id, "listeners released");
    }

    pub fn listeners_active(&self) -> bool {
        let doc = self.document.borrow();
        self.listeners.iter().any(|(id, _)| doc.has_listener(*id))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    /// Mutable state; call [`redraw`](Self::redraw) afterwards
    pub fn state_mut(&mut self) -> &mut PickerState {
        &mut self.state
    }

    pub fn adapter(&self) -> &dyn DateAdapter {
        self.adapter.as_ref()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn document(&self) -> SharedDocument {
        Rc::clone(&self.document)
    }

    /// The element the widget was mounted into
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Root of the rendered tree
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The rendered text input
    pub fn input_node(&self) -> Option<NodeId> {
        self.document.borrow().query_tag(self.root, "input")
    }

    /// The value formatted with `format`, empty while there is no value
    pub fn input(&self) -> String {
        self.state.input_text(self.adapter.as_ref())
    }

    pub fn container_id(&self) -> &str {
        &self.state.container_id
    }

    pub fn input_id(&self) -> &str {
        &self.state.input_id
    }

    pub fn valid(&self) -> bool {
        self.state.valid
    }

    /// The selected date, `None` while empty
    pub fn value(&self) -> Option<NaiveDateTime> {
        self.state.model()
    }

    /// Set or clear the value. The host is not notified.
    pub fn set_value(&mut self, value: Option<NaiveDateTime>) {
        match value {
            Some(date) => {
                self.state.value = date;
                self.state.empty = false;
            }
            None => self.state.empty = true,
        }
        self.state.revalidate();
        self.redraw();
    }

    pub fn display(&self) -> bool {
        self.state.display
    }

    pub fn set_display(&mut self, display: bool) {
        self.state.display = display;
        self.redraw();
    }

    pub fn min(&self) -> NaiveDateTime {
        self.state.min
    }

    pub fn set_min(&mut self, min: NaiveDateTime) {
        self.state.min = min;
        self.range_changed();
    }

    pub fn max(&self) -> NaiveDateTime {
        self.state.max
    }

    pub fn set_max(&mut self, max: NaiveDateTime) {
        self.state.max = max;
        self.range_changed();
    }

    fn range_changed(&mut self) {
        if self.state.range_inverted() {
            warn!(
                min = %self.state.min,
                max = %self.state.max,
                "min is after max, selectors will be empty"
            );
        }
        self.state.revalidate();
        self.redraw();
    }

    pub fn format(&self) -> &str {
        &self.state.format
    }

    pub fn set_format(&mut self, format: impl Into<String>) {
        self.state.format = format.into();
        self.redraw();
    }

    pub fn months(&self) -> &[String] {
        &self.state.months
    }

    pub fn set_months(&mut self, months: Vec<String>) {
        self.state.months = months;
        self.redraw();
    }

    pub fn days(&self) -> &[String] {
        &self.state.days
    }

    pub fn set_days(&mut self, days: Vec<String>) {
        self.state.days = days;
        self.redraw();
    }

    /// Extension keys, as merged at construction
    pub fn extensions(&self) -> &IndexMap<String, serde_json::Value> {
        &self.state.extensions
    }
}

impl fmt::Debug for DatePicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatePicker")
            .field("state", &self.state)
            .field("composition", &self.composition)
            .field("container", &self.container)
            .field("root", &self.root)
            .field("listeners", &self.listeners.len())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
