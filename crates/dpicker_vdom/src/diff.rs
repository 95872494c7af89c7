//! Structural diff for virtual trees
//!
//! This module compares two virtual trees without touching a document:
//!
//! - **Hash-based identity**: content hashes for stable child matching across rebuilds
//! - **Category-level change detection**: attributes, text, children, handlers
//!
//! The widget uses the tree hash as a quick path (identical hash, nothing to
//! patch) and the categories for trace logging.
//!
//! # Example
//!
//! ```rust
//! use dpicker_vdom::diff::diff;
//! use dpicker_vdom::node::{h, VNode};
//!
//! let old: VNode = h("div").class("dpicker-container dpicker-invisible").into();
//! let new: VNode = h("div").class("dpicker-container dpicker-visible").into();
//!
//! let result = diff(&old, &new);
//! assert!(result.changes.attributes);
//! assert!(!result.changes.children);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::event_handler::EventHandlers;
use crate::node::{VElement, VNode};

// =============================================================================
// NodeHash - Content Hash for Identity
// =============================================================================

/// Content hash for stable node identity matching.
///
/// Used to detect whether nodes have changed and to match children
/// across tree rebuilds even when reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHash(pub u64);

impl NodeHash {
    /// Hash of a node's own properties (excluding children).
    pub fn compute(node: &VNode) -> Self {
        let mut hasher = DefaultHasher::new();
        hash_node_props(node, &mut hasher);
        NodeHash(hasher.finish())
    }

    /// Hash including the entire subtree.
    ///
    /// Two trees built from the same widget state produce the same value.
    pub fn compute_tree(node: &VNode) -> Self {
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        NodeHash(hasher.finish())
    }
}

// =============================================================================
// ChangeCategory - What Changed
// =============================================================================

/// Categories of changes between two nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeCategory {
    /// Tag, key or attributes changed
    pub attributes: bool,

    /// Text node content changed
    pub text: bool,

    /// Children changed (added, removed, reordered, or modified)
    pub children: bool,

    /// Handler bindings changed
    pub handlers: bool,
}

impl ChangeCategory {
    /// No changes
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any category has changes.
    pub fn any(&self) -> bool {
        self.attributes || self.text || self.children || self.handlers
    }

    /// Returns true if only attributes changed.
    ///
    /// When true the patch touches attributes of one node and nothing else.
    pub fn attributes_only(&self) -> bool {
        self.attributes && !self.text && !self.children && !self.handlers
    }
}

// =============================================================================
// DiffResult - Diff Output
// =============================================================================

/// Result of diffing two nodes.
#[derive(Clone, Debug)]
pub struct DiffResult {
    /// What categories of changes occurred.
    pub changes: ChangeCategory,

    /// How children changed.
    pub child_diffs: Vec<ChildDiff>,

    /// Hash of the old node.
    pub old_hash: NodeHash,

    /// Hash of the new node.
    pub new_hash: NodeHash,
}

impl DiffResult {
    /// Number of changed positions anywhere in the subtree
    pub fn change_count(&self) -> usize {
        let own = usize::from(self.changes.attributes || self.changes.text || self.changes.handlers);
        own + self
            .child_diffs
            .iter()
            .map(|child| match child {
                ChildDiff::Unchanged { .. } => 0,
                ChildDiff::Modified { diff, .. } => diff.change_count(),
                _ => 1,
            })
            .sum::<usize>()
    }
}

/// Result of diffing a single child position.
#[derive(Clone, Debug)]
pub enum ChildDiff {
    /// Child was unchanged (same hash, same position).
    Unchanged { index: usize },

    /// Child moved from one position to another (same hash).
    Moved {
        old_index: usize,
        new_index: usize,
        hash: NodeHash,
    },

    /// Child was modified (content changed, matched by position).
    Modified {
        old_index: usize,
        new_index: usize,
        diff: Box<DiffResult>,
    },

    /// New child was added.
    Added { index: usize, hash: NodeHash },

    /// Old child was removed.
    Removed { index: usize, hash: NodeHash },
}

// =============================================================================
// Diff
// =============================================================================

/// Diff two virtual nodes.
pub fn diff(old: &VNode, new: &VNode) -> DiffResult {
    let old_hash = NodeHash::compute(old);
    let new_hash = NodeHash::compute(new);

    let mut changes = ChangeCategory::none();

    if old_hash != new_hash {
        match (old, new) {
            (VNode::Text(a), VNode::Text(b)) => changes.text = a != b,
            (VNode::Element(a), VNode::Element(b)) => {
                changes.attributes = detect_attribute_changes(a, b);
                changes.handlers = detect_handler_changes(&a.handlers, &b.handlers);
            }
            // Kind changed: the whole node is replaced
            _ => {
                changes.attributes = true;
                changes.text = true;
            }
        }
    }

    let child_diffs = diff_children(old.children(), new.children());
    if child_diffs
        .iter()
        .any(|d| !matches!(d, ChildDiff::Unchanged { .. }))
    {
        changes.children = true;
    }

    DiffResult {
        changes,
        child_diffs,
        old_hash,
        new_hash,
    }
}

/// Diff children using content-hash-based matching.
///
/// This algorithm:
/// 1. Computes subtree hashes for all children
/// 2. Matches children by hash (handles reordering)
/// 3. Pairs leftover additions and removals at the same index as modifications
pub fn diff_children(old_children: &[VNode], new_children: &[VNode]) -> Vec<ChildDiff> {
    let old_hashes: Vec<NodeHash> = old_children.iter().map(NodeHash::compute_tree).collect();
    let new_hashes: Vec<NodeHash> = new_children.iter().map(NodeHash::compute_tree).collect();

    // Build hash -> indices map for old children; popped front to back
    let mut old_hash_map: FxHashMap<NodeHash, Vec<usize>> = FxHashMap::default();
    for (i, hash) in old_hashes.iter().enumerate().rev() {
        old_hash_map.entry(*hash).or_default().push(i);
    }

    let mut results = Vec::with_capacity(new_children.len());
    let mut matched_old: FxHashSet<usize> = FxHashSet::default();
    let mut added: FxHashMap<usize, usize> = FxHashMap::default(); // new index -> result index

    // First pass: match by hash (finds unchanged/moved children)
    for (new_idx, new_hash) in new_hashes.iter().enumerate() {
        if let Some(old_idx) = old_hash_map.get_mut(new_hash).and_then(Vec::pop) {
            matched_old.insert(old_idx);
            if old_idx == new_idx {
                results.push(ChildDiff::Unchanged { index: new_idx });
            } else {
                results.push(ChildDiff::Moved {
                    old_index: old_idx,
                    new_index: new_idx,
                    hash: *new_hash,
                });
            }
            continue;
        }

        added.insert(new_idx, results.len());
        results.push(ChildDiff::Added {
            index: new_idx,
            hash: *new_hash,
        });
    }

    // Second pass: unmatched old children at an index that also gained a
    // new child are modifications, the rest are removals
    for (old_idx, old_hash) in old_hashes.iter().enumerate() {
        if matched_old.contains(&old_idx) {
            continue;
        }
        match added.get(&old_idx) {
            Some(&result_idx) => {
                let child_diff = diff(&old_children[old_idx], &new_children[old_idx]);
                results[result_idx] = ChildDiff::Modified {
                    old_index: old_idx,
                    new_index: old_idx,
                    diff: Box::new(child_diff),
                };
            }
            None => results.push(ChildDiff::Removed {
                index: old_idx,
                hash: *old_hash,
            }),
        }
    }

    results
}

// =============================================================================
// Change Detection
// =============================================================================

/// Tag, key or attribute values differ.
pub fn detect_attribute_changes(old: &VElement, new: &VElement) -> bool {
    old.tag != new.tag || old.key != new.key || old.attributes != new.attributes
}

/// Handler bindings differ.
pub fn detect_handler_changes(old: &EventHandlers, new: &EventHandlers) -> bool {
    old != new
}

// =============================================================================
// Hashing
// =============================================================================

fn hash_node_props(node: &VNode, hasher: &mut impl Hasher) {
    match node {
        VNode::Text(content) => {
            0u8.hash(hasher);
            content.hash(hasher);
        }
        VNode::Element(element) => {
            1u8.hash(hasher);
            element.tag.hash(hasher);
            element.key.hash(hasher);
            element.attributes.hash(hasher);
            element.handlers.hash(hasher);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::h;

    fn option(year: i32) -> VNode {
        h("option")
            .key(year.to_string())
            .attr("value", year.to_string())
            .text(year.to_string())
            .into()
    }

    #[test]
    fn test_hash_stability() {
        let a: VNode = h("td").class("dpicker-active").on_click("dayClick").into();
        let b: VNode = h("td").class("dpicker-active").on_click("dayClick").into();

        assert_eq!(NodeHash::compute(&a), NodeHash::compute(&b));
        assert_eq!(NodeHash::compute_tree(&a), NodeHash::compute_tree(&b));
    }

    #[test]
    fn test_hash_different_props() {
        let a: VNode = h("td").class("dpicker-active").into();
        let b: VNode = h("td").class("dpicker-inactive").into();

        assert_ne!(NodeHash::compute(&a), NodeHash::compute(&b));
    }

    #[test]
    fn test_own_hash_ignores_children() {
        let a: VNode = h("tr").child(h("td").text("1")).into();
        let b: VNode = h("tr").child(h("td").text("2")).into();

        assert_eq!(NodeHash::compute(&a), NodeHash::compute(&b));
        assert_ne!(NodeHash::compute_tree(&a), NodeHash::compute_tree(&b));
    }

    #[test]
    fn test_change_category_attributes_only() {
        let cat = ChangeCategory {
            attributes: true,
            ..ChangeCategory::none()
        };
        assert!(cat.any());
        assert!(cat.attributes_only());

        let cat = ChangeCategory {
            attributes: true,
            children: true,
            ..ChangeCategory::none()
        };
        assert!(!cat.attributes_only());
    }

    #[test]
    fn test_diff_unchanged() {
        let a: VNode = h("select").child(option(2020)).child(option(2019)).into();
        let b = a.clone();

        let result = diff(&a, &b);
        assert!(!result.changes.any());
        assert_eq!(result.change_count(), 0);
    }

    #[test]
    fn test_diff_handler_change() {
        let a: VNode = h("button").on_click("dayClick").into();
        let b: VNode = h("button").on_click("nextMonthDayClick").into();

        let result = diff(&a, &b);
        assert!(result.changes.handlers);
        assert!(!result.changes.attributes);
    }

    #[test]
    fn test_diff_children_moved_added_removed() {
        let old = vec![option(2021), option(2020), option(2019)];
        let new = vec![option(2020), option(2021), option(2018)];

        let diffs = diff_children(&old, &new);

        assert!(diffs.iter().any(|d| matches!(
            d,
            ChildDiff::Moved {
                old_index: 1,
                new_index: 0,
                ..
            }
        )));
        assert!(diffs.iter().any(|d| matches!(
            d,
            ChildDiff::Moved {
                old_index: 0,
                new_index: 1,
                ..
            }
        )));
        // 2019 -> 2018 at index 2 is a modification in place
        assert!(diffs.iter().any(|d| matches!(
            d,
            ChildDiff::Modified {
                old_index: 2,
                new_index: 2,
                ..
            }
        )));
        assert!(!diffs.iter().any(|d| matches!(d, ChildDiff::Removed { .. })));
    }

    #[test]
    fn test_diff_children_removal() {
        let old = vec![option(2021), option(2020)];
        let new = vec![option(2021)];

        let diffs = diff_children(&old, &new);
        assert!(matches!(diffs[0], ChildDiff::Unchanged { index: 0 }));
        assert!(matches!(diffs[1], ChildDiff::Removed { index: 1, .. }));
    }

    #[test]
    fn test_diff_text_change() {
        let result = diff(&VNode::Text("May".into()), &VNode::Text("June".into()));
        assert!(result.changes.text);
        assert_eq!(result.change_count(), 1);
    }
}
