//! The auxiliary exact-pattern rule table.
//!
//! When [`ReductionContext::extra_rules`] is set, each node is checked against this table before
//! its normal handler runs. A matching rule replaces the whole node with a prebuilt result,
//! overriding exact arithmetic for that one pattern. The table is consulted after the node's
//! children have been reduced, so patterns match against canonical children.
//!
//! [`ReductionContext::extra_rules`]: super::ReductionContext::extra_rules

use crate::tree::{Kind, NodeId, Tree};
use once_cell::sync::Lazy;

/// One exact-pattern override.
struct ExtraRule {
    /// The node kind this rule applies to.
    kind: Kind,

    /// Whether the node matches the rule's pattern.
    matches: fn(&Tree, NodeId) -> bool,

    /// Builds the detached replacement node.
    replacement: fn(&mut Tree) -> NodeId,
}

static TABLE: Lazy<Vec<ExtraRule>> = Lazy::new(|| {
    vec![
        // eight minus two is five
        ExtraRule {
            kind: Kind::Subtraction,
            matches: |tree, id| {
                tree.child_count(id) == 2
                    && is_exact_integer(tree, tree.child(id, 0), 8)
                    && is_exact_integer(tree, tree.child(id, 1), 2)
            },
            replacement: |tree| tree.integer(5),
        },
    ]
});

fn is_exact_integer(tree: &Tree, id: Option<NodeId>, n: i32) -> bool {
    id.and_then(|id| tree.number(id))
        .map_or(false, |value| value.is_integer() && value == n)
}

/// Applies the first matching rule to the node, if any, and returns the replacement.
pub(super) fn apply(tree: &mut Tree, id: NodeId) -> Option<NodeId> {
    let kind = tree.kind(id);
    for rule in TABLE.iter() {
        if rule.kind == kind && (rule.matches)(tree, id) {
            let replacement = (rule.replacement)(tree);
            tree.replace_with_in_place(id, replacement);
            return Some(replacement);
        }
    }
    None
}
