//! An arena-backed expression tree supporting in-place node replacement.
//!
//! Nodes live in a slab of records addressed by stable [`NodeId`] indices, with parent
//! back-links. "Replace this node with that one" is an O(1) overwrite of the parent's child
//! slot; no raw pointers are involved, and replacing the root simply redirects the tree's root
//! reference. [`Tree::replace_with_in_place`] is the **only** mutation primitive the reduction
//! engine uses to alter tree shape.
//!
//! Every node is tagged with a [`Kind`] from a closed enumeration. Dispatch over kinds is done
//! with exhaustive `match` expressions, so adding a kind is a compile-time-checked change
//! everywhere it matters.

mod from_ast;

pub use from_ast::{from_ast, FromAstError};

use rug::{Integer, Rational};
use std::cmp::Ordering;

/// A stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The closed set of operator / value kinds a node can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// An n-ary sum.
    Addition,

    /// A binary subtraction. Never present in canonical form; it rewrites into an [`Addition`]
    /// of a negated term.
    ///
    /// [`Addition`]: Kind::Addition
    Subtraction,

    /// An n-ary product.
    Multiplication,

    /// A binary division. Never present in canonical form; it rewrites into a product with a
    /// [`Power`] of exponent -1.
    ///
    /// [`Power`]: Kind::Power
    Division,

    /// A base raised to an exponent.
    Power,

    /// Unary negation. Never present in canonical form; it rewrites into multiplication
    /// by -1.
    Opposite,

    /// The complex conjugate of its single child.
    Conjugate,

    /// An exact rational number.
    Rational,

    /// An integer literal carrying its source base (2, 8, or 16). Reduces to [`Rational`].
    ///
    /// [`Rational`]: Kind::Rational
    BasedInteger,

    /// A named symbol, such as `x`.
    Symbol,

    /// The propagated domain-error marker. Absorbs any expression containing it.
    Undefined,
}

/// The value stored inside a leaf node.
#[derive(Debug, Clone, PartialEq)]
enum Payload {
    /// No payload; the node is a pure operator.
    None,

    /// The value of a [`Kind::Rational`] node.
    Number(Rational),

    /// The value and base of a [`Kind::BasedInteger`] node.
    BasedInteger(Integer, u8),

    /// The name of a [`Kind::Symbol`] node.
    Symbol(String),
}

/// A single node record in the arena.
#[derive(Debug, Clone)]
struct Node {
    kind: Kind,
    payload: Payload,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// An expression tree stored as an arena of node records.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// The node records. A `None` slot is free and may be reused.
    nodes: Vec<Option<Node>>,

    /// Indices of free slots, reused before the arena grows.
    free: Vec<usize>,

    /// The root of the tree, once one has been designated.
    root: Option<NodeId>,
}

impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root of the tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Designates the root of the tree. The node must be detached.
    pub fn set_root(&mut self, id: NodeId) {
        debug_assert!(self.node(id).parent.is_none(), "root must not have a parent");
        self.root = Some(id);
    }

    /// Returns the number of live nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns true if the arena holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().expect("stale node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().expect("stale node id")
    }

    fn insert(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            },
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            },
        }
    }

    /// Sets `parent` as the parent of each node in `children`. Each child must be detached; a
    /// node has at most one parent slot at any time.
    fn adopt(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            debug_assert!(
                self.node(child).parent.is_none(),
                "a node cannot occupy two parent slots",
            );
            self.node_mut(child).parent = Some(parent);
        }
    }

    /// Returns the kind of the node.
    pub fn kind(&self, id: NodeId) -> Kind {
        self.node(id).kind
    }

    /// Returns the parent of the node, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the number of children of the node.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Returns the `i`-th child of the node, or [`None`] if `i` is out of range.
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.node(id).children.get(i).copied()
    }

    /// Returns the children of the node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns true if the node's kind is one of the given kinds.
    pub fn is_of_kind(&self, id: NodeId, kinds: &[Kind]) -> bool {
        kinds.contains(&self.node(id).kind)
    }

    /// Returns true if the node is a numeric value ([`Kind::Rational`] or
    /// [`Kind::BasedInteger`]).
    pub fn is_number(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, Kind::Rational | Kind::BasedInteger)
    }

    /// Returns the numeric value of the node, if it is a number.
    pub fn number(&self, id: NodeId) -> Option<Rational> {
        match &self.node(id).payload {
            Payload::Number(value) => Some(value.clone()),
            Payload::BasedInteger(value, _) => Some(Rational::from(value)),
            _ => None,
        }
    }

    /// Returns the sign of the node's numeric value, if it is a number: `Less` for negative,
    /// `Equal` for zero, `Greater` for positive.
    pub fn sign(&self, id: NodeId) -> Option<Ordering> {
        match &self.node(id).payload {
            Payload::Number(value) => Some(value.cmp0()),
            Payload::BasedInteger(value, _) => Some(value.cmp0()),
            _ => None,
        }
    }

    /// Returns the name of the node, if it is a symbol.
    pub fn symbol_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).payload {
            Payload::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the value and base of the node, if it is a based integer.
    pub fn based_integer(&self, id: NodeId) -> Option<(&Integer, u8)> {
        match &self.node(id).payload {
            Payload::BasedInteger(value, base) => Some((value, *base)),
            _ => None,
        }
    }

    /// Creates a [`Kind::Rational`] node with the given value.
    pub fn rational(&mut self, value: Rational) -> NodeId {
        self.insert(Node {
            kind: Kind::Rational,
            payload: Payload::Number(value),
            children: Vec::new(),
            parent: None,
        })
    }

    /// Creates a [`Kind::Rational`] node with the given integer value.
    pub fn integer<T>(&mut self, n: T) -> NodeId
    where
        Integer: From<T>,
    {
        self.rational(Rational::from(Integer::from(n)))
    }

    /// Creates a [`Kind::BasedInteger`] node with the given value and base.
    pub fn based(&mut self, value: Integer, base: u8) -> NodeId {
        self.insert(Node {
            kind: Kind::BasedInteger,
            payload: Payload::BasedInteger(value, base),
            children: Vec::new(),
            parent: None,
        })
    }

    /// Creates a [`Kind::Symbol`] node with the given name.
    pub fn symbol(&mut self, name: &str) -> NodeId {
        self.insert(Node {
            kind: Kind::Symbol,
            payload: Payload::Symbol(name.to_string()),
            children: Vec::new(),
            parent: None,
        })
    }

    /// Creates a [`Kind::Undefined`] node.
    pub fn undefined(&mut self) -> NodeId {
        self.insert(Node {
            kind: Kind::Undefined,
            payload: Payload::None,
            children: Vec::new(),
            parent: None,
        })
    }

    /// Creates an operator node with a single child. The child must be detached.
    pub fn unary(&mut self, kind: Kind, child: NodeId) -> NodeId {
        self.nary(kind, vec![child])
    }

    /// Creates an operator node with two children. The children must be detached.
    pub fn binary(&mut self, kind: Kind, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.nary(kind, vec![lhs, rhs])
    }

    /// Creates an operator node with the given children. The children must be detached.
    pub fn nary(&mut self, kind: Kind, children: Vec<NodeId>) -> NodeId {
        let id = self.insert(Node {
            kind,
            payload: Payload::None,
            children,
            parent: None,
        });
        let children = self.node(id).children.clone();
        self.adopt(id, &children);
        id
    }

    /// Detaches and returns all children of the node, clearing their parent links. The node
    /// itself stays in place with zero children.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for &child in &children {
            self.node_mut(child).parent = None;
        }
        children
    }

    /// Re-attaches the given children to the node, which must currently have none.
    pub fn give_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        debug_assert!(self.node(id).children.is_empty());
        self.adopt(id, &children);
        self.node_mut(id).children = children;
    }

    /// Replaces `old` with `new` in `old`'s parent slot, then frees `old` and whatever remains
    /// of its subtree.
    ///
    /// The replacement is atomic with respect to the tree: afterward, `new` alone occupies the
    /// slot, its parent link set, and `old`'s parent link is cleared. If `old` is the tree's
    /// root, the root reference is redirected to `new` instead. If `old` is fully detached,
    /// only the free happens.
    ///
    /// `new` must be detached and must not be a descendant of `old`.
    pub fn replace_with_in_place(&mut self, old: NodeId, new: NodeId) {
        debug_assert_ne!(old, new);
        debug_assert!(self.node(new).parent.is_none(), "replacement must be detached");

        match self.node(old).parent {
            Some(parent) => {
                let slot = self
                    .node(parent)
                    .children
                    .iter()
                    .position(|&c| c == old)
                    .expect("parent link desynchronized from child slot");
                self.node_mut(parent).children[slot] = new;
                self.node_mut(new).parent = Some(parent);
                self.node_mut(old).parent = None;
            },
            None => {
                if self.root == Some(old) {
                    self.root = Some(new);
                }
            },
        }

        self.free_subtree(old);
    }

    /// Frees a detached node and every node still reachable from it.
    pub fn free_subtree(&mut self, id: NodeId) {
        debug_assert!(self.node(id).parent.is_none(), "cannot free an attached node");

        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = self.nodes[id.0].take().expect("stale node id");
            stack.extend(node.children);
            self.free.push(id.0);
        }
    }

    /// Returns true if the subtree at `a` is structurally identical to the subtree at `b` in
    /// `other`: same kinds, same payloads, same children in the same order.
    pub fn structural_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), other.node(b));
        na.kind == nb.kind
            && na.payload == nb.payload
            && na.children.len() == nb.children.len()
            && na
                .children
                .iter()
                .zip(&nb.children)
                .all(|(&ca, &cb)| self.structural_eq(ca, other, cb))
    }

    /// Returns true if the subtrees at `a` and `b` within this tree are structurally identical.
    pub fn eq_subtree(&self, a: NodeId, b: NodeId) -> bool {
        self.structural_eq(a, self, b)
    }

    /// A total structural order over subtrees, used to sort the children of commutative
    /// operators into canonical order: numbers first (by value), then symbols (by name), then
    /// composite nodes by kind and children.
    pub fn cmp_subtree(&self, a: NodeId, b: NodeId) -> Ordering {
        fn rank(kind: Kind) -> u8 {
            match kind {
                Kind::Rational | Kind::BasedInteger => 0,
                Kind::Symbol => 1,
                Kind::Power => 2,
                Kind::Multiplication => 3,
                Kind::Addition => 4,
                Kind::Conjugate => 5,
                Kind::Opposite => 6,
                Kind::Subtraction => 7,
                Kind::Division => 8,
                Kind::Undefined => 9,
            }
        }

        let (na, nb) = (self.node(a), self.node(b));
        rank(na.kind)
            .cmp(&rank(nb.kind))
            .then_with(|| match (&na.payload, &nb.payload) {
                (Payload::Number(x), Payload::Number(y)) => x.cmp(y),
                (Payload::Symbol(x), Payload::Symbol(y)) => x.cmp(y),
                _ => Ordering::Equal,
            })
            .then_with(|| {
                let mut ord = na.children.len().cmp(&nb.children.len());
                for (&ca, &cb) in na.children.iter().zip(&nb.children) {
                    if ord != Ordering::Equal {
                        break;
                    }
                    ord = self.cmp_subtree(ca, cb);
                }
                ord
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::primitive::rat;
    use super::*;

    #[test]
    fn child_access_is_bounds_checked() {
        let mut tree = Tree::new();
        let two = tree.integer(2);
        let x = tree.symbol("x");
        let mul = tree.binary(Kind::Multiplication, two, x);

        assert_eq!(tree.child_count(mul), 2);
        assert_eq!(tree.child(mul, 0), Some(two));
        assert_eq!(tree.child(mul, 1), Some(x));
        assert_eq!(tree.child(mul, 2), None);
    }

    #[test]
    fn category_and_number_queries() {
        let mut tree = Tree::new();
        let n = tree.rational(rat((-3, 4)));
        let x = tree.symbol("x");
        let sub = tree.binary(Kind::Subtraction, x, n);

        assert!(tree.is_number(n));
        assert_eq!(tree.sign(n), Some(Ordering::Less));
        assert!(tree.is_of_kind(sub, &[Kind::Subtraction, Kind::Opposite, Kind::Addition]));
        assert!(!tree.is_of_kind(x, &[Kind::Subtraction, Kind::Opposite, Kind::Addition]));
    }

    #[test]
    fn replace_in_parent_slot() {
        let mut tree = Tree::new();
        let a = tree.symbol("a");
        let b = tree.symbol("b");
        let add = tree.binary(Kind::Addition, a, b);
        tree.set_root(add);

        let five = tree.integer(5);
        tree.replace_with_in_place(b, five);

        assert_eq!(tree.children(add), &[a, five]);
        assert_eq!(tree.parent(five), Some(add));
        // the old node's slot was freed
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn replace_root_redirects_root_reference() {
        let mut tree = Tree::new();
        let a = tree.symbol("a");
        let b = tree.symbol("b");
        let sub = tree.binary(Kind::Subtraction, a, b);
        tree.set_root(sub);

        let zero = tree.integer(0);
        tree.replace_with_in_place(sub, zero);

        assert_eq!(tree.root(), Some(zero));
        assert_eq!(tree.parent(zero), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn take_children_detaches() {
        let mut tree = Tree::new();
        let a = tree.symbol("a");
        let b = tree.symbol("b");
        let add = tree.binary(Kind::Addition, a, b);

        let children = tree.take_children(add);
        assert_eq!(children, vec![a, b]);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.child_count(add), 0);
    }

    #[test]
    fn structural_equality_is_ordered() {
        let mut tree = Tree::new();
        let a1 = tree.symbol("a");
        let b1 = tree.symbol("b");
        let add1 = tree.binary(Kind::Addition, a1, b1);

        let a2 = tree.symbol("a");
        let b2 = tree.symbol("b");
        let add2 = tree.binary(Kind::Addition, a2, b2);

        let b3 = tree.symbol("b");
        let a3 = tree.symbol("a");
        let add3 = tree.binary(Kind::Addition, b3, a3);

        assert!(tree.eq_subtree(add1, add2));
        assert!(!tree.eq_subtree(add1, add3));
    }

    #[test]
    fn subtree_order_puts_numbers_first() {
        let mut tree = Tree::new();
        let x = tree.symbol("x");
        let two = tree.integer(2);
        assert_eq!(tree.cmp_subtree(two, x), Ordering::Less);
        assert_eq!(tree.cmp_subtree(x, two), Ordering::Greater);
    }
}
