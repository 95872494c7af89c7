//! Reconciler - patches a live document to match a virtual tree
//!
//! Patching is minimal: nodes whose tag (or kind) still matches are reused
//! and only their differing attributes, bindings and text are touched, so a
//! focused input or a selected option survives a redraw.
//!
//! Children are matched in two passes:
//!
//! 1. **Keyed**: a virtual child with a key reuses the old child with the
//!    same key and tag, wherever it was.
//! 2. **Positional**: an unkeyed virtual child reuses the first unused,
//!    unkeyed old child of the same tag (or the next text node).
//!
//! Unmatched old children are removed, new ones are created, and a final
//! ordering pass moves reused nodes into place.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::document::{Document, NodeId, NodeKind};
use crate::node::{VElement, VNode};

/// Build a detached subtree for `vnode`
pub fn create(doc: &mut Document, vnode: &VNode) -> NodeId {
    match vnode {
        VNode::Text(content) => doc.create_text(content.as_str()),
        VNode::Element(element) => {
            let id = doc.create_element(element.tag.as_str());
            for (name, value) in &element.attributes {
                doc.set_attribute(id, name, value);
            }
            doc.set_handlers(id, &element.handlers);
            doc.set_key(id, element.key.clone());
            for child in &element.children {
                let child_id = create(doc, child);
                doc.append_child(id, child_id);
            }
            id
        }
    }
}

/// Build `vnode` and append it to `parent`
pub fn mount(doc: &mut Document, parent: NodeId, vnode: &VNode) -> NodeId {
    let id = create(doc, vnode);
    doc.append_child(parent, id);
    id
}

/// Patch `node` to match `vnode`.
///
/// Returns the id now representing `vnode`: `node` itself, or a freshly
/// created replacement when the tag or node kind differs.
pub fn reconcile(doc: &mut Document, node: NodeId, vnode: &VNode) -> NodeId {
    if !doc.contains(node) {
        return create(doc, vnode);
    }
    if !can_patch(doc, node, vnode) {
        return replace(doc, node, vnode);
    }

    match vnode {
        VNode::Text(content) => doc.set_text(node, content),
        VNode::Element(element) => patch_element(doc, node, element),
    }
    node
}

fn can_patch(doc: &Document, node: NodeId, vnode: &VNode) -> bool {
    match (doc.node(node).map(|n| &n.kind), vnode) {
        (Some(NodeKind::Text(_)), VNode::Text(_)) => true,
        (Some(NodeKind::Element(data)), VNode::Element(element)) => data.tag == element.tag,
        _ => false,
    }
}

fn replace(doc: &mut Document, node: NodeId, vnode: &VNode) -> NodeId {
    trace!(tag = ?vnode.tag(), "replacing subtree");
    let replacement = create(doc, vnode);
    if let Some(parent) = doc.parent(node) {
        let index = doc
            .children(parent)
            .iter()
            .position(|&c| c == node)
            .unwrap_or(0);
        doc.insert_child(parent, index, replacement);
    }
    doc.remove(node);
    replacement
}

fn patch_element(doc: &mut Document, node: NodeId, element: &VElement) {
    let stale: Vec<String> = doc
        .attributes(node)
        .map(|attrs| {
            attrs
                .keys()
                .filter(|name| !element.attributes.contains_key(name.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    for name in stale {
        doc.remove_attribute(node, &name);
    }
    for (name, value) in &element.attributes {
        doc.set_attribute(node, name, value);
    }

    doc.set_handlers(node, &element.handlers);
    doc.set_key(node, element.key.clone());

    reconcile_children(doc, node, &element.children);

    match element.tag.as_str() {
        "input" if doc.value(node) != element.attribute("value").unwrap_or_default() => {
            doc.reset_value(node)
        }
        "select" => doc.reset_value(node),
        _ => {}
    }
}

/// Reconcile the children of `parent` against `new_children`
pub fn reconcile_children(doc: &mut Document, parent: NodeId, new_children: &[VNode]) {
    let old_children = doc.children(parent).to_vec();

    let mut keyed: FxHashMap<String, NodeId> = FxHashMap::default();
    let mut unkeyed: Vec<Option<NodeId>> = Vec::new();
    for &child in &old_children {
        match doc.key(child) {
            Some(key) => {
                keyed.insert(key.to_string(), child);
            }
            None => unkeyed.push(Some(child)),
        }
    }

    let mut desired = Vec::with_capacity(new_children.len());
    for vchild in new_children {
        let matched = match vchild.key() {
            Some(key) => keyed
                .remove(key)
                .filter(|&old| can_patch(doc, old, vchild)),
            None => unkeyed
                .iter_mut()
                .find(|slot| slot.is_some_and(|old| can_patch(doc, old, vchild)))
                .and_then(Option::take),
        };

        let id = match matched {
            Some(old) => reconcile(doc, old, vchild),
            None => create(doc, vchild),
        };
        desired.push(id);
    }

    // Leftovers no longer have a counterpart
    for &old in &old_children {
        if !desired.contains(&old) && doc.parent(old) == Some(parent) {
            doc.remove(old);
        }
    }

    for (index, &id) in desired.iter().enumerate() {
        if doc.children(parent).get(index) != Some(&id) {
            doc.insert_child(parent, index, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::h;

    fn year_select(years: &[i32], selected: i32) -> VNode {
        h("select")
            .attr("name", "dpicker-year")
            .on_change("yearChange")
            .children(years.iter().map(|&year| {
                h("option")
                    .key(year.to_string())
                    .attr("value", year.to_string())
                    .attr_if(year == selected, "selected", "selected")
                    .text(year.to_string())
            }))
            .into()
    }

    #[test]
    fn test_mount_builds_tree() {
        let mut doc = Document::new();
        let body = doc.body();
        let root = mount(&mut doc, body, &year_select(&[2021, 2020], 2020));

        assert_eq!(doc.tag(root), Some("select"));
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.value(root), "2020");
        assert_eq!(doc.key(doc.children(root)[0]), Some("2021"));
    }

    #[test]
    fn test_identical_reconcile_is_free() {
        let mut doc = Document::new();
        let body = doc.body();
        let tree = year_select(&[2021, 2020, 2019], 2020);
        let root = mount(&mut doc, body, &tree);
        doc.reset_stats();

        assert_eq!(reconcile(&mut doc, root, &tree), root);
        assert_eq!(doc.stats().total(), 0);
    }

    #[test]
    fn test_keyed_children_are_reused() {
        let mut doc = Document::new();
        let body = doc.body();
        let root = mount(&mut doc, body, &year_select(&[2021, 2020, 2019], 2020));
        let kept = doc.children(root)[1];
        doc.reset_stats();

        reconcile(&mut doc, root, &year_select(&[2022, 2021, 2020], 2020));

        let children = doc.children(root).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(children[2], kept);
        assert_eq!(doc.stats().removed, 2); // option 2019 and its text
        assert_eq!(doc.stats().moved, 0);
        assert_eq!(
            children.iter().map(|&c| doc.value(c)).collect::<Vec<_>>(),
            vec!["2022", "2021", "2020"]
        );
    }

    #[test]
    fn test_tag_change_replaces_node() {
        let mut doc = Document::new();
        let body = doc.body();
        let old: VNode = h("td").child(h("span").text("3")).into();
        let new: VNode = h("td")
            .child(h("button").attr("value", "3").on_click("dayClick").text("3"))
            .into();
        let td = mount(&mut doc, body, &old);
        let span = doc.children(td)[0];

        assert_eq!(reconcile(&mut doc, td, &new), td);
        let button = doc.children(td)[0];
        assert_ne!(button, span);
        assert!(!doc.contains(span));
        assert_eq!(doc.tag(button), Some("button"));
        assert_eq!(doc.value(button), "3");
    }

    #[test]
    fn test_root_replacement_keeps_position() {
        let mut doc = Document::new();
        let body = doc.body();
        let first = mount(&mut doc, body, &h("p").into());
        let second = mount(&mut doc, body, &h("span").into());

        let replaced = reconcile(&mut doc, first, &h("div").into());
        assert_eq!(doc.children(doc.body()), &[replaced, second]);
    }

    #[test]
    fn test_stale_attributes_removed() {
        let mut doc = Document::new();
        let body = doc.body();
        let old: VNode = h("input").attr("class", "dpicker-invalid").attr("value", "x").into();
        let new: VNode = h("input").attr("value", "x").into();
        let input = mount(&mut doc, body, &old);

        reconcile(&mut doc, input, &new);
        assert_eq!(doc.attribute(input, "class"), None);
    }

    #[test]
    fn test_focus_survives_and_live_value_follows_markup() {
        let mut doc = Document::new();
        let body = doc.body();
        let v1: VNode = h("div")
            .child(h("input").attr("value", "01/01/2020").on_focus("inputFocus"))
            .child(h("div").class("dpicker-invisible"))
            .into();
        let v2: VNode = h("div")
            .child(h("input").attr("value", "01/01/2020").on_focus("inputFocus"))
            .child(h("div").class("dpicker-visible"))
            .into();
        let root = mount(&mut doc, body, &v1);
        let input = doc.children(root)[0];
        doc.focus(input);
        doc.set_value(input, "typed");

        reconcile(&mut doc, root, &v2);
        assert_eq!(doc.focused(), Some(input));
        assert_eq!(doc.value(input), "01/01/2020");
    }

    #[test]
    fn test_matching_live_value_is_untouched() {
        let mut doc = Document::new();
        let body = doc.body();
        let tree: VNode = h("input").attr("value", "01/01/2020").into();
        let input = mount(&mut doc, body, &tree);
        doc.set_value(input, "01/01/2020");

        reconcile(&mut doc, input, &tree);
        assert!(doc.has_live_value(input));
    }

    #[test]
    fn test_value_attribute_change_resets_live_value() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = mount(&mut doc, body, &h("input").attr("value", "a").into());
        doc.set_value(input, "typed");

        reconcile(&mut doc, input, &h("input").attr("value", "b").into());
        assert_eq!(doc.value(input), "b");
    }

    #[test]
    fn test_select_reflects_selected_option_after_patch() {
        let mut doc = Document::new();
        let body = doc.body();
        let select = mount(&mut doc, body, &year_select(&[2021, 2020], 2021));
        doc.set_value(select, "2020");

        reconcile(&mut doc, select, &year_select(&[2021, 2020], 2021));
        assert_eq!(doc.value(select), "2021");
    }
}
