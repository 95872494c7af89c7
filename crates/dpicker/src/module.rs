//! Extension modules and the per-widget composition table
//!
//! A [`Module`] contributes named handlers, render slots, default
//! extension keys and attribute parsing. Modules are merged once, when the
//! widget is built, into an immutable [`Composition`]; nothing can be
//! registered afterwards.
//!
//! # Handler chaining
//!
//! A module handler whose name is already taken runs *before* the existing
//! handlers for that name. With two modules overriding `dayKeyDown`, the
//! last one composed runs first, then the first one, then the built-in.

use std::fmt;
use std::rc::Rc;

use dpicker_core::DateAdapter;
use dpicker_vdom::{EventContext, VNode};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::AttributeOverrides;
use crate::handlers;
use crate::picker::DatePicker;
use crate::state::PickerState;

/// A named event handler
pub type Handler = Rc<dyn Fn(&mut DatePicker, &EventContext)>;

/// Builds a render slot; `None` skips the slot
pub type SlotBuilder = Rc<dyn Fn(&PickerState, &dyn DateAdapter) -> Option<VNode>>;

/// Extension keys contributed by modules
pub type Extensions = IndexMap<String, serde_json::Value>;

/// A capability provider merged into a widget at construction
pub trait Module {
    /// Module name, used in logs
    fn name(&self) -> &str;

    /// Handlers to add, or to chain in front of existing ones
    fn events(&self) -> Vec<(String, Handler)> {
        Vec::new()
    }

    /// Render slots, placed by name through `order`
    fn slots(&self) -> Vec<(String, SlotBuilder)> {
        Vec::new()
    }

    /// Default values for the module's extension keys
    fn defaults(&self, _extensions: &mut Extensions) {}

    /// Read module attributes off the input element the widget is mounted on
    fn parse_attributes(
        &self,
        _attributes: &IndexMap<String, String>,
        _extensions: &mut Extensions,
        _overrides: &mut AttributeOverrides,
    ) {
    }

    /// Runs once after the state is resolved, before the first render
    fn initialize(&self, _picker: &mut DatePicker) {}
}

/// Merged handlers and slots of one widget
pub struct Composition {
    handlers: FxHashMap<String, SmallVec<[Handler; 1]>>,
    slots: IndexMap<String, SlotBuilder>,
    modules: Vec<Rc<dyn Module>>,
}

impl Composition {
    /// Built-in handlers only
    pub fn builtin() -> Self {
        let mut handlers: FxHashMap<String, SmallVec<[Handler; 1]>> = FxHashMap::default();
        for (name, handler) in handlers::builtin() {
            handlers.entry(name.to_string()).or_default().push(handler);
        }
        Self {
            handlers,
            slots: IndexMap::new(),
            modules: Vec::new(),
        }
    }

    /// Merge `modules`, in order, over the built-ins
    pub fn compose(modules: Vec<Rc<dyn Module>>) -> Self {
        let mut composition = Self::builtin();
        for module in &modules {
            for (name, handler) in module.events() {
                composition
                    .handlers
                    .entry(name)
                    .or_default()
                    .insert(0, handler);
            }
            for (name, builder) in module.slots() {
                composition.slots.insert(name, builder);
            }
        }
        composition.modules = modules;
        composition
    }

    /// Handlers bound to `name`, in run order
    pub fn handlers(&self, name: &str) -> SmallVec<[Handler; 1]> {
        self.handlers.get(name).cloned().unwrap_or_default()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// All handler names
    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn slot(&self, name: &str) -> Option<&SlotBuilder> {
        self.slots.get(name)
    }

    pub fn modules(&self) -> &[Rc<dyn Module>] {
        &self.modules
    }

    /// Extension defaults of every module
    pub fn extension_defaults(&self) -> Extensions {
        let mut extensions = Extensions::new();
        for module in &self.modules {
            module.defaults(&mut extensions);
        }
        extensions
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&str> = self.handler_names().collect();
        handlers.sort_unstable();
        f.debug_struct("Composition")
            .field("handlers", &handlers)
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpicker_vdom::h;

    struct Footer;

    impl Module for Footer {
        fn name(&self) -> &str {
            "footer"
        }

        fn events(&self) -> Vec<(String, Handler)> {
            vec![
                ("dayKeyDown".to_string(), Rc::new(|_: &mut DatePicker, _: &EventContext| {}) as Handler),
                ("footerClick".to_string(), Rc::new(|_: &mut DatePicker, _: &EventContext| {}) as Handler),
            ]
        }

        fn slots(&self) -> Vec<(String, SlotBuilder)> {
            vec![(
                "footer".to_string(),
                Rc::new(|_: &PickerState, _: &dyn DateAdapter| Some(h("footer").into())) as SlotBuilder,
            )]
        }

        fn defaults(&self, extensions: &mut Extensions) {
            extensions.insert("footer".to_string(), serde_json::Value::Bool(true));
        }
    }

    #[test]
    fn test_builtin_table() {
        let composition = Composition::builtin();
        for name in [
            handlers::INPUT_CHANGE,
            handlers::INPUT_FOCUS,
            handlers::INPUT_BLUR,
            handlers::HIDE,
            handlers::YEAR_CHANGE,
            handlers::MONTH_CHANGE,
            handlers::DAY_CLICK,
            handlers::PREVIOUS_MONTH_DAY_CLICK,
            handlers::NEXT_MONTH_DAY_CLICK,
            handlers::DAY_KEY_DOWN,
            handlers::KEY_DOWN,
        ] {
            assert_eq!(composition.handlers(name).len(), 1, "{name}");
        }
        assert!(composition.handlers("missing").is_empty());
    }

    #[test]
    fn test_compose_chains_and_adds() {
        let composition = Composition::compose(vec![Rc::new(Footer)]);

        assert_eq!(composition.handlers("dayKeyDown").len(), 2);
        assert_eq!(composition.handlers("footerClick").len(), 1);
        assert!(composition.slot("footer").is_some());
        assert!(composition.slot("time").is_none());
        assert_eq!(
            composition.extension_defaults().get("footer"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(composition.modules().len(), 1);
    }
}
