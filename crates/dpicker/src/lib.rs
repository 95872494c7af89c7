//! dpicker - a date picker widget driven by a virtual tree
//!
//! One [`DatePicker`] per widget: a state store, a view builder that turns
//! the state into a virtual tree, a reconciler that patches the shared
//! document, and named event handlers that mutate the state.
//!
//! # Example
//!
//! ```rust
//! use dpicker::prelude::*;
//!
//! let doc = Document::new().into_shared();
//! let body = doc.borrow().body();
//!
//! let mut picker = DatePicker::builder()
//!     .options(DatePickerOptions::new().format("YYYY-MM-DD"))
//!     .module(TimeModule::new())
//!     .on_change(|state, event| println!("{}: {:?}", event.name, state.model()))
//!     .mount(&doc, body)
//!     .unwrap();
//!
//! let input = picker.input_node().unwrap();
//! picker.handle_event(&DomEvent::new(event_types::FOCUS, input));
//! assert!(picker.display());
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod module;
pub mod navigation;
pub mod picker;
pub mod state;
pub mod time;
pub mod view;

pub use config::{AttributeOverrides, DatePickerOptions, ModelOption};
pub use error::{DatePickerError, Result};
pub use module::{Composition, Extensions, Handler, Module, SlotBuilder};
pub use navigation::ArrowNavigation;
pub use picker::{ChangeEvent, DatePicker, DatePickerBuilder, MountTarget, OnChange};
pub use state::PickerState;
pub use time::TimeModule;
pub use view::{CellMonth, DayCell, DayGrid};

// Re-export the layers below for convenience
pub use dpicker_core;
pub use dpicker_vdom;

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::config::{DatePickerOptions, ModelOption};
    pub use crate::error::{DatePickerError, Result};
    pub use crate::module::Module;
    pub use crate::navigation::ArrowNavigation;
    pub use crate::picker::{ChangeEvent, DatePicker};
    pub use crate::state::PickerState;
    pub use crate::time::TimeModule;

    pub use dpicker_core::{event_types, key_codes, ChronoAdapter, DateAdapter, NaiveDateTime};
    pub use dpicker_vdom::{Document, DomEvent, NodeId, SharedDocument};
}
