//! dpicker virtual tree
//!
//! Declarative node builder, in-memory document and reconciler.
//!
//! # Example
//!
//! ```rust
//! use dpicker_vdom::prelude::*;
//!
//! let view = |visible: bool| -> VNode {
//!     h("div")
//!         .class("dpicker-container")
//!         .class(if visible { "dpicker-visible" } else { "dpicker-invisible" })
//!         .attr("aria-hidden", (!visible).to_string())
//!         .into()
//! };
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let root = mount(&mut doc, body, &view(false));
//!
//! doc.reset_stats();
//! reconcile(&mut doc, root, &view(true));
//! assert_eq!(doc.stats().attributes_set, 2);
//! ```

pub mod diff;
pub mod document;
pub mod event_handler;
pub mod html;
pub mod key;
pub mod node;
pub mod reconcile;

// Tree types
pub use document::{
    Document, DomNode, ElementData, GlobalListener, ListenerId, MutationStats, NodeId, NodeKind,
    SharedDocument,
};
pub use node::{h, text, VElement, VNode};

// Events
pub use event_handler::{DomEvent, EventContext, EventHandlers, HandlerName};

// Diff and reconciliation
pub use diff::{diff, diff_children, ChangeCategory, ChildDiff, DiffResult, NodeHash};
pub use reconcile::{create, mount, reconcile, reconcile_children};

// Ids and serialisation
pub use html::{to_html, vnode_to_html};
pub use key::{unique_id, InstanceId};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::document::{Document, ListenerId, NodeId, SharedDocument};
    pub use crate::event_handler::{DomEvent, EventContext, EventHandlers};
    pub use crate::node::{h, text, VElement, VNode};
    pub use crate::reconcile::{mount, reconcile};
}
