//! HTML serialisation of documents and virtual trees
//!
//! Mostly useful for snapshots in tests and for hosts that render the
//! widget server-side. Handler bindings are not serialised.

use crate::document::{Document, NodeId};
use crate::node::VNode;

/// Elements without closing tags
const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta"];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Serialise the subtree rooted at `node`
pub fn to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    if let Some(content) = doc.text(node) {
        out.push_str(&html_escape::encode_text(content));
        return;
    }
    let Some(tag) = doc.tag(node) else {
        return;
    };
    out.push('<');
    out.push_str(tag);
    if let Some(attributes) = doc.attributes(node) {
        for (name, value) in attributes {
            write_attribute(name, value, out);
        }
    }
    out.push('>');
    if is_void(tag) {
        return;
    }
    for &child in doc.children(node) {
        write_node(doc, child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Serialise a virtual tree
pub fn vnode_to_html(vnode: &VNode) -> String {
    let mut out = String::new();
    write_vnode(vnode, &mut out);
    out
}

fn write_vnode(vnode: &VNode, out: &mut String) {
    match vnode {
        VNode::Text(content) => out.push_str(&html_escape::encode_text(content)),
        VNode::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                write_attribute(name, value, out);
            }
            out.push('>');
            if is_void(&element.tag) {
                return;
            }
            for child in &element.children {
                write_vnode(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn write_attribute(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}
